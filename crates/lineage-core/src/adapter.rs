//! `RunAdapter`: forma la identidad run/job y emite el protocolo de dos fases
//! (RUNNING, luego COMPLETE) para una ejecución de task.
//!
//! El adapter no guarda estado entre llamadas: la correlación entre ambos
//! eventos es el `run_id` (y `job_name`) que el llamador repite.
use chrono::{DateTime, Utc};
use log::debug;
use serde_json::{json, Value};

use crate::errors::AdapterError;
use crate::event::{EventType, JobInfo, RunEvent, RunInfo, Transport, PARENT_RUN_FACET};
use crate::model::{Facets, StepMetadata, TaskDescriptor, WorkflowDescriptor};

pub const NOMINAL_TIME_FACET: &str = "nominalTime";
pub const SOURCE_CODE_LOCATION_FACET: &str = "sourceCodeLocation";
pub const DOCUMENTATION_FACET: &str = "documentation";

/// Datos de entrada del evento RUNNING.
#[derive(Debug, Clone)]
pub struct StartTask<'a> {
    pub run_id: &'a str,
    pub job_name: &'a str,
    pub job_description: Option<&'a str>,
    /// Hora del evento. El hook pasa el `start_date` de la task instance y
    /// sólo usa el reloj de pared de la llamada cuando éste falta. Es
    /// distinta de la ventana nominal.
    pub event_time: DateTime<Utc>,
    pub parent_run_id: Option<&'a str>,
    /// Job del run padre (el workflow). Si falta se deriva de `job_name`.
    pub parent_job_name: Option<&'a str>,
    pub code_location: Option<&'a str>,
    pub nominal_start_time: Option<DateTime<Utc>>,
    pub nominal_end_time: Option<DateTime<Utc>>,
    pub step: &'a StepMetadata,
    /// Facets del llamador; ganan sobre los del step en caso de colisión.
    pub run_facets: Facets,
}

/// Datos de entrada del evento COMPLETE.
#[derive(Debug, Clone)]
pub struct CompleteTask<'a> {
    pub run_id: &'a str,
    pub job_name: &'a str,
    pub end_time: DateTime<Utc>,
    pub step: &'a StepMetadata,
}

pub struct RunAdapter<T: Transport> {
    transport: T,
    namespace: String,
    producer: String,
}

impl<T: Transport> RunAdapter<T> {
    pub fn new(transport: T, namespace: impl Into<String>, producer: impl Into<String>) -> Self {
        Self { transport,
               namespace: namespace.into(),
               producer: producer.into() }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Construye y envía el evento RUNNING. Devuelve el evento enviado.
    pub fn start_task(&self, start: StartTask<'_>) -> Result<RunEvent, AdapterError> {
        let mut run_facets = start.step.run_facets.clone();
        if let Some(nominal) = nominal_time_facet(start.nominal_start_time, start.nominal_end_time) {
            run_facets.insert(NOMINAL_TIME_FACET.to_string(), nominal);
        }
        if let Some(parent) = start.parent_run_id {
            let parent_job = start.parent_job_name
                                  .unwrap_or_else(|| start.job_name.split_once('.').map_or(start.job_name, |(wf, _)| wf));
            run_facets.insert(PARENT_RUN_FACET.to_string(), self.parent_run_facet(parent, parent_job));
        }
        run_facets.extend(start.run_facets);

        let mut job_facets = start.step.job_facets.clone();
        if let Some(location) = start.code_location {
            job_facets.insert(SOURCE_CODE_LOCATION_FACET.to_string(), json!({ "type": "file", "url": location }));
        }
        if let Some(description) = start.job_description {
            job_facets.insert(DOCUMENTATION_FACET.to_string(), json!({ "description": description }));
        }

        let event = RunEvent { event_type: EventType::Running,
                               event_time: start.event_time,
                               run: RunInfo { run_id: start.run_id.to_string(),
                                              facets: run_facets },
                               job: JobInfo { namespace: self.namespace.clone(),
                                              name: start.job_name.to_string(),
                                              facets: job_facets },
                               inputs: start.step.inputs.clone(),
                               outputs: start.step.outputs.clone(),
                               producer: self.producer.clone() };
        self.send(event)
    }

    /// Construye y envía el evento COMPLETE para el mismo run.
    pub fn complete_task(&self, complete: CompleteTask<'_>) -> Result<RunEvent, AdapterError> {
        let event = RunEvent { event_type: EventType::Complete,
                               event_time: complete.end_time,
                               run: RunInfo { run_id: complete.run_id.to_string(),
                                              facets: complete.step.run_facets.clone() },
                               job: JobInfo { namespace: self.namespace.clone(),
                                              name: complete.job_name.to_string(),
                                              facets: complete.step.job_facets.clone() },
                               inputs: complete.step.inputs.clone(),
                               outputs: complete.step.outputs.clone(),
                               producer: self.producer.clone() };
        self.send(event)
    }

    fn send(&self, event: RunEvent) -> Result<RunEvent, AdapterError> {
        debug!("adapter:send type={} run_id={} job={} inputs={} outputs={}",
               event.event_type.as_str(),
               event.run.run_id,
               event.job.name,
               event.inputs.len(),
               event.outputs.len());
        self.transport
            .send(&event)
            .map_err(|source| AdapterError::Send { event_type: event.event_type.as_str(),
                                                   run_id: event.run.run_id.clone(),
                                                   source })?;
        Ok(event)
    }

    fn parent_run_facet(&self, parent_run_id: &str, parent_job: &str) -> Value {
        json!({
            "run": { "runId": parent_run_id },
            "job": { "namespace": self.namespace, "name": parent_job },
        })
    }
}

fn nominal_time_facet(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Option<Value> {
    let start = start?;
    let mut facet = json!({ "nominalStartTime": start.to_rfc3339() });
    if let Some(end) = end {
        facet["nominalEndTime"] = json!(end.to_rfc3339());
    }
    Some(facet)
}

/// Ubicación del código: archivo propio de la task, si no el del workflow.
/// Cualquier referencia vacía cuenta como desconocida.
pub fn resolve_code_location(task: &TaskDescriptor, workflow: &WorkflowDescriptor) -> Option<String> {
    [task.source_file.as_deref(), workflow.file_location.as_deref()].into_iter()
                                                                    .flatten()
                                                                    .map(str::trim)
                                                                    .find(|p| !p.is_empty())
                                                                    .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TransportError;
    use crate::event::InMemoryTransport;
    use crate::model::Dataset;
    use chrono::TimeZone;

    fn adapter() -> (RunAdapter<InMemoryTransport>, InMemoryTransport) {
        let t = InMemoryTransport::new();
        (RunAdapter::new(t.clone(), "default", "flowlineage-test"), t)
    }

    fn ts(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 3, 1, h, 0, 0).unwrap()
    }

    fn start<'a>(step: &'a StepMetadata) -> StartTask<'a> {
        StartTask { run_id: "r1",
                    job_name: "d.t1",
                    job_description: Some("daily food report"),
                    event_time: ts(10),
                    parent_run_id: Some("scheduled__2021-03-01"),
                    parent_job_name: None,
                    code_location: Some("dags/food.py"),
                    nominal_start_time: Some(ts(0)),
                    nominal_end_time: None,
                    step,
                    run_facets: Facets::new() }
    }

    #[test]
    fn start_then_complete_share_run_id() {
        let (a, t) = adapter();
        let step = StepMetadata::named("d.t1").with_outputs(vec![Dataset::new("ns", "t_out")]);
        a.start_task(start(&step)).unwrap();
        a.complete_task(CompleteTask { run_id: "r1",
                                       job_name: "d.t1",
                                       end_time: ts(11),
                                       step: &step })
         .unwrap();
        let events = t.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, EventType::Running);
        assert_eq!(events[1].event_type, EventType::Complete);
        assert_eq!(events[0].run.run_id, events[1].run.run_id);
        assert!(events[1].event_time >= events[0].event_time);
        assert_eq!(events[1].outputs, vec![Dataset::new("ns", "t_out")]);
    }

    #[test]
    fn start_event_carries_parent_nominal_and_code_facets() {
        let (a, _) = adapter();
        let step = StepMetadata::named("d.t1");
        let ev = a.start_task(start(&step)).unwrap();
        assert_eq!(ev.parent_run_id(), Some("scheduled__2021-03-01"));
        assert_eq!(ev.run.facets[PARENT_RUN_FACET]["job"]["name"], json!("d"));
        assert_eq!(ev.run.facets[NOMINAL_TIME_FACET],
                   json!({"nominalStartTime": "2021-03-01T00:00:00+00:00"}));
        assert_eq!(ev.job.facets[SOURCE_CODE_LOCATION_FACET]["url"], json!("dags/food.py"));
        assert_eq!(ev.job.facets[DOCUMENTATION_FACET]["description"], json!("daily food report"));
        assert_eq!(ev.job.namespace, "default");
    }

    #[test]
    fn complete_event_has_no_parent() {
        let (a, _) = adapter();
        let step = StepMetadata::named("d.t1");
        let ev = a.complete_task(CompleteTask { run_id: "r1",
                                                job_name: "d.t1",
                                                end_time: ts(11),
                                                step: &step })
                  .unwrap();
        assert_eq!(ev.parent_run_id(), None);
        assert!(!ev.run.facets.contains_key(NOMINAL_TIME_FACET));
    }

    #[test]
    fn caller_facets_win_over_step_facets() {
        let (a, _) = adapter();
        let step = StepMetadata::named("d.t1").with_run_facet("shared", json!("fromStep"))
                                              .with_run_facet("stepOnly", json!(1));
        let mut s = start(&step);
        s.run_facets.insert("shared".into(), json!("fromCaller"));
        let ev = a.start_task(s).unwrap();
        assert_eq!(ev.run.facets["shared"], json!("fromCaller"));
        assert_eq!(ev.run.facets["stepOnly"], json!(1));
    }

    #[test]
    fn transport_failure_surfaces_as_adapter_error() {
        struct Down;
        impl Transport for Down {
            fn send(&self, _e: &RunEvent) -> Result<(), TransportError> {
                Err(TransportError::Rejected("collector unavailable".into()))
            }
        }
        let a = RunAdapter::new(Down, "default", "p");
        let step = StepMetadata::named("d.t1");
        let err = a.start_task(start(&step)).unwrap_err();
        assert!(err.to_string().contains("RUNNING"));
    }

    #[test]
    fn code_location_prefers_task_then_workflow() {
        let wf = WorkflowDescriptor::new("d").with_file_location("dags/d.py");
        let t = TaskDescriptor::new("t", "X");
        assert_eq!(resolve_code_location(&t, &wf).as_deref(), Some("dags/d.py"));
        let t = t.with_source_file("ops/t.sql");
        assert_eq!(resolve_code_location(&t, &wf).as_deref(), Some("ops/t.sql"));
        let t = TaskDescriptor::new("t", "X").with_source_file("   ");
        assert_eq!(resolve_code_location(&t, &WorkflowDescriptor::new("d")), None);
    }
}
