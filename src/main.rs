//! lineage-demo: alimenta el backend con callbacks de task y muestra los
//! eventos emitidos.
//!
//! Uso: `lineage-demo [event.json]`. El archivo contiene un `TaskEvent` o una
//! lista. Sin argumento corre una muestra de tres tasks.
use std::error::Error;
use std::{env, fs};

use chrono::{Duration, TimeZone, Utc};
use flowlineage::{build_backend, LineageConfig};
use lineage_core::{Schedule, TaskDescriptor, TaskEvent, TaskInstanceDescriptor, WorkflowDescriptor,
                   WorkflowRunDescriptor};
use serde::Deserialize;
use serde_json::{json, to_string_pretty};

#[derive(Deserialize)]
#[serde(untagged)]
enum EventFile {
    One(Box<TaskEvent>),
    Many(Vec<TaskEvent>),
}

fn load_events(path: &str) -> Result<Vec<TaskEvent>, Box<dyn Error>> {
    let raw = fs::read_to_string(path)?;
    Ok(match serde_json::from_str(&raw)? {
        EventFile::One(ev) => vec![*ev],
        EventFile::Many(evs) => evs,
    })
}

/// Workflow `food_delivery` diario con una task Postgres, una sin extractor y
/// una BigQuery con estadísticas del job.
fn sample_events() -> Vec<TaskEvent> {
    let execution_date = Utc.with_ymd_and_hms(2021, 3, 1, 0, 0, 0).single().unwrap_or_else(Utc::now);
    let workflow = WorkflowDescriptor::new("food_delivery").with_description("Entregas y tiempos por restaurante")
                                                           .with_schedule(Schedule::Daily)
                                                           .with_file_location("dags/food_delivery.py");
    let run = WorkflowRunDescriptor { run_id: "scheduled__2021-03-01T00:00:00".into(),
                                      execution_date,
                                      external_trigger: false };
    let instance = |offset_min: i64, artifacts: serde_json::Value| {
        let start = execution_date + Duration::days(1) + Duration::minutes(offset_min);
        TaskInstanceDescriptor { start_date: Some(start),
                                 end_date: Some(start + Duration::minutes(2)),
                                 try_number: 1,
                                 artifacts }
    };

    let tasks = [(TaskDescriptor::new("top_delivery_times", "PostgresOperator").with_properties(json!({
                     "sql": "INSERT INTO top_delivery_times SELECT order_id, delivery_time FROM delivery_times \
                             WHERE delivery_time > 30",
                     "database": "food_delivery",
                     "postgres_conn_id": "food_delivery_db"
                 })),
                  instance(0, serde_json::Value::Null)),
                 (TaskDescriptor::new("notify_ops", "SlackWebhookOperator"), instance(3, serde_json::Value::Null)),
                 (TaskDescriptor::new("daily_rollup", "BigQueryExecuteQueryOperator").with_properties(json!({
                     "sql": "SELECT restaurant_id, AVG(delivery_time) FROM `food.raw.deliveries` GROUP BY 1"
                 })),
                  instance(6,
                           json!({"bigquery_job": {
                               "statistics": {"query": {
                                   "cacheHit": false,
                                   "totalBytesBilled": "20971520",
                                   "referencedTables": [{"projectId": "food", "datasetId": "raw", "tableId": "deliveries"}]
                               }},
                               "configuration": {"query": {
                                   "destinationTable": {"projectId": "food", "datasetId": "mart", "tableId": "daily_rollup"}
                               }}
                           }})))];

    tasks.into_iter()
         .map(|(task, ti)| TaskEvent { task,
                                       workflow: workflow.clone(),
                                       run: Some(run.clone()),
                                       task_instance: Some(ti) })
         .collect()
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                                                                                   tracing_subscriber::EnvFilter::new("info")
                                                                               }))
                             .with_writer(std::io::stderr)
                             .init();

    let config = LineageConfig::from_env()?;
    let mut hook = build_backend(&config)?;

    let events = match env::args().nth(1) {
        Some(path) => load_events(&path)?,
        None => sample_events(),
    };

    for event in &events {
        let outcome = hook.on_task_event(event);
        eprintln!("[demo] job={} run_id={} events_sent={}",
                  outcome.job_name, outcome.run_id, outcome.events_sent);
    }

    for event in hook.adapter().transport().retained() {
        println!("{}", to_string_pretty(&event)?);
    }
    Ok(())
}
