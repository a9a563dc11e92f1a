//! Tablas leídas y escritas por un script SQL, sobre el AST de `sqlparser`.
//!
//! - lectura: toda relación que aparezca como `TableFactor` (FROM, JOIN,
//!   subconsultas), salvo llamadas a función y nombres definidos como CTE.
//! - escritura: destino de INSERT, CREATE TABLE / VIEW, UPDATE, DELETE,
//!   MERGE y COPY hacia tabla.
//!
//! Los identificadores conservan si venían entre comillas: al normalizar
//! mayúsculas/minúsculas sólo se pliegan las partes sin comillas.
use std::ops::ControlFlow;

use sqlparser::ast::{CopySource, Delete, FromTable, Ident, Insert, ObjectName, Query, Statement, TableFactor, Visit,
                     Visitor};
use sqlparser::dialect::Dialect;
use sqlparser::parser::{Parser, ParserError};

/// Plegado aplicado a las partes sin comillas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentCase {
    Lower,
    Upper,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct NamePart {
    value: String,
    quoted: bool,
}

impl NamePart {
    fn folded(&self, case: IdentCase) -> String {
        match (self.quoted, case) {
            (true, _) => self.value.clone(),
            (false, IdentCase::Lower) => self.value.to_lowercase(),
            (false, IdentCase::Upper) => self.value.to_uppercase(),
        }
    }
}

impl From<&Ident> for NamePart {
    fn from(ident: &Ident) -> Self {
        Self { value: ident.value.clone(),
               quoted: ident.quote_style.is_some() }
    }
}

/// Nombre de tabla tal como aparece en el SQL (`a.b."C"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    parts: Vec<NamePart>,
}

impl TableRef {
    /// Partes sin comillas, unidas por `.`.
    pub fn as_written(&self) -> String {
        self.parts.iter().map(|p| p.value.as_str()).collect::<Vec<_>>().join(".")
    }

    /// Igual que `as_written` pero plegando las partes sin comillas.
    pub fn folded(&self, case: IdentCase) -> String {
        self.parts.iter().map(|p| p.folded(case)).collect::<Vec<_>>().join(".")
    }

    fn key(&self) -> String {
        self.folded(IdentCase::Lower)
    }

    fn single_part_key(&self) -> Option<String> {
        match self.parts.as_slice() {
            [only] => Some(only.folded(IdentCase::Lower)),
            _ => None,
        }
    }
}

impl From<&ObjectName> for TableRef {
    fn from(name: &ObjectName) -> Self {
        Self { parts: name.0.iter().map(NamePart::from).collect() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlMeta {
    pub in_tables: Vec<TableRef>,
    pub out_tables: Vec<TableRef>,
}

#[derive(Default)]
struct TableCollector {
    ctes: Vec<String>,
    reads: Vec<TableRef>,
    writes: Vec<TableRef>,
}

impl TableCollector {
    fn write(&mut self, name: &ObjectName) {
        self.writes.push(name.into());
    }

    fn write_relation(&mut self, factor: &TableFactor) {
        if let TableFactor::Table { name, .. } = factor {
            self.write(name);
        }
    }

    fn finish(self) -> SqlMeta {
        let mut out_tables: Vec<TableRef> = Vec::new();
        for table in self.writes {
            if !out_tables.iter().any(|t| t.key() == table.key()) {
                out_tables.push(table);
            }
        }
        let mut in_tables: Vec<TableRef> = Vec::new();
        for table in self.reads {
            let is_cte = table.single_part_key().is_some_and(|k| self.ctes.contains(&k));
            let seen = in_tables.iter().chain(out_tables.iter()).any(|t| t.key() == table.key());
            if !is_cte && !seen {
                in_tables.push(table);
            }
        }
        SqlMeta { in_tables, out_tables }
    }
}

impl Visitor for TableCollector {
    type Break = ();

    fn pre_visit_query(&mut self, query: &Query) -> ControlFlow<()> {
        if let Some(with) = &query.with {
            self.ctes
                .extend(with.cte_tables.iter().map(|cte| NamePart::from(&cte.alias.name).folded(IdentCase::Lower)));
        }
        ControlFlow::Continue(())
    }

    fn pre_visit_table_factor(&mut self, factor: &TableFactor) -> ControlFlow<()> {
        // `args` presente: función de tabla (generate_series(..)), no una tabla.
        if let TableFactor::Table { name, args: None, .. } = factor {
            self.reads.push(name.into());
        }
        ControlFlow::Continue(())
    }

    fn pre_visit_statement(&mut self, statement: &Statement) -> ControlFlow<()> {
        match statement {
            Statement::Insert(Insert { table_name, .. }) => self.write(table_name),
            Statement::CreateTable(create) => self.write(&create.name),
            Statement::CreateView { name, .. } => self.write(name),
            Statement::Update { table, .. } => self.write_relation(&table.relation),
            Statement::Delete(Delete { from, .. }) => {
                let (FromTable::WithFromKeyword(tables) | FromTable::WithoutKeyword(tables)) = from;
                for table in tables {
                    self.write_relation(&table.relation);
                }
            }
            Statement::Merge { table, .. } => self.write_relation(table),
            Statement::Copy { source: CopySource::Table { table_name, .. },
                              to: false,
                              .. } => self.write(table_name),
            Statement::CopyIntoSnowflake { into, .. } => self.write(into),
            _ => {}
        }
        ControlFlow::Continue(())
    }
}

/// Tablas leídas y escritas por una o varias sentencias. Una tabla escrita
/// en el script nunca se reporta además como entrada.
pub fn parse(sql: &str, dialect: &dyn Dialect) -> Result<SqlMeta, ParserError> {
    let statements = Parser::parse_sql(dialect, sql)?;
    let mut collector = TableCollector::default();
    for statement in &statements {
        let _ = statement.visit(&mut collector);
    }
    Ok(collector.finish())
}

/// Califica `table` a `database.schema.table` completando las partes que
/// falten. Con tres o más partes se devuelve tal cual.
pub fn qualify_table(table: &str, database: Option<&str>, default_schema: Option<&str>) -> String {
    let parts: Vec<&str> = table.split('.').collect();
    let (schema, name) = match parts.as_slice() {
        [name] => (default_schema, *name),
        [schema, name] => (Some(*schema), *name),
        _ => return table.to_string(),
    };
    [database, schema, Some(name)].into_iter().flatten().collect::<Vec<_>>().join(".")
}
