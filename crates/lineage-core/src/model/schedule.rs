//! Función de agenda de un workflow: mapea una fecha de ejecución a la
//! siguiente. Se usa para calcular la ventana nominal de una task.
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Schedule {
    /// Sin agenda (sólo disparos manuales/externos): no hay siguiente ejecución.
    #[default]
    Manual,
    Hourly,
    Daily,
    Weekly,
    /// Intervalo fijo en segundos. Valores <= 0 se tratan como `Manual`.
    Interval { seconds: i64 },
}

impl Schedule {
    /// Periodo de la agenda; `None` si no hay o no cabe en un `Duration`.
    fn period(&self) -> Option<Duration> {
        match self {
            Schedule::Manual => None,
            Schedule::Hourly => Duration::try_hours(1),
            Schedule::Daily => Duration::try_days(1),
            Schedule::Weekly => Duration::try_weeks(1),
            Schedule::Interval { seconds } if *seconds > 0 => Duration::try_seconds(*seconds),
            Schedule::Interval { .. } => None,
        }
    }

    /// Siguiente fecha de ejecución después de `execution_date`. `None` si
    /// no hay agenda o el resultado se sale del rango representable.
    pub fn following(&self, execution_date: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.period().and_then(|p| execution_date.checked_add_signed(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn daily_schedule_advances_one_day() {
        let ts = Utc.with_ymd_and_hms(2021, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(Schedule::Daily.following(ts), Some(Utc.with_ymd_and_hms(2021, 3, 2, 0, 0, 0).unwrap()));
    }

    #[test]
    fn manual_and_non_positive_intervals_have_no_next_run() {
        let ts = Utc.with_ymd_and_hms(2021, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(Schedule::Manual.following(ts), None);
        assert_eq!(Schedule::Interval { seconds: 0 }.following(ts), None);
        assert_eq!(Schedule::Interval { seconds: 90 }.following(ts),
                   Some(Utc.with_ymd_and_hms(2021, 3, 1, 0, 1, 30).unwrap()));
    }

    #[test]
    fn out_of_range_interval_has_no_next_run() {
        let ts = Utc.with_ymd_and_hms(2021, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(Schedule::Interval { seconds: i64::MAX }.following(ts), None);
        assert_eq!(Schedule::Weekly.following(DateTime::<Utc>::MAX_UTC), None);
        assert_eq!(Schedule::Hourly.following(DateTime::<Utc>::MAX_UTC), None);
    }

    #[test]
    fn schedule_deserializes_from_tagged_json() {
        let s: Schedule = serde_json::from_str(r#"{"type":"interval","seconds":3600}"#).unwrap();
        assert_eq!(s, Schedule::Interval { seconds: 3600 });
    }
}
