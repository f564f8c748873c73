use crate::entities::Task;
use crate::entities::TaskStatus::{Downloading, Seeding};
use byte_unit::{Byte, UnitType};

impl Task {
    #[must_use]
    pub fn calculate_size(&self) -> String {
        let size = Byte::from(self.size());
        format!("{:#.2}", size.get_appropriate_unit(UnitType::Decimal))
    }

    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn calculate_progress(&self) -> f64 {
        let size_downloaded = self.additional().transfer().size_downloaded();
        Some((size_downloaded as f64 / self.size() as f64 * 100.0).round())
            .take_if(|x| x.is_finite())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn calculate_speed(&self) -> String {
        let transfer = self.additional().transfer();
        let speed = match self.status() {
            Downloading => transfer.speed_download(),
            Seeding => transfer.speed_upload(),
            _ => return String::new(),
        };

        if speed == 0 {
            return String::new();
        }

        format!(
            "({:#.2}/s)",
            Byte::from(speed).get_appropriate_unit(UnitType::Decimal)
        )
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    #[must_use]
    pub fn calculate_time_left(&self) -> String {
        if self.status() != Downloading {
            return String::new();
        }

        let transfer = self.additional().transfer();
        let speed_download = transfer.speed_download();
        let time_left = if speed_download == 0 {
            -1i64
        } else {
            ((self.size() as f64 - transfer.size_downloaded() as f64) / speed_download as f64)
                .floor() as i64
        };

        format!("⏳Time left: {}", convert_time_left(time_left))
    }
}

#[must_use]
pub fn convert_time_left(input: i64) -> String {
    if input < 0 {
        return String::from("Unknown");
    }

    if input < 60 {
        return format!("{input} s");
    }

    if input < 3600 {
        let minutes = input / 60;
        let seconds = input - 60 * minutes;
        return format!("{minutes} m {seconds} s");
    }

    if input < 86400 {
        let hours = input / 3600;
        let minutes = (input - hours * 3600) / 60;
        return format!("{hours} h {minutes} m");
    }

    let days = input / 86400;
    let hours = (input - days * 86400) / 3600;
    let minutes = (input - days * 86400 - hours * 3600) / 60;
    format!("{days} d {hours} h {minutes} m")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Model;
    use serde_json::{Value, json};

    fn create_test_task(status: &str, transfer: Value) -> Task {
        Task::materialize(json!({
            "id": "123",
            "username": "Bob",
            "type": "bt",
            "title": "Ubuntu 16.04",
            "size": 1_234_567_890,
            "status": status,
            "additional": {"transfer": transfer}
        }))
    }

    #[test]
    fn test_calculate_size() {
        let task = create_test_task("downloading", json!({}));
        assert_eq!("1.23 GB", task.calculate_size());
    }

    #[test]
    fn test_calculate_progress() {
        let task = create_test_task("downloading", json!({"size_downloaded": 617_283_945}));
        assert!((task.calculate_progress() - 50.0).abs() < f64::EPSILON);

        let empty = Task::materialize(json!({"size": 0}));
        assert!(empty.calculate_progress().abs() < f64::EPSILON);
    }

    #[test]
    fn test_calculate_speed() {
        let task = create_test_task("downloading", json!({"speed_download": 98765}));
        assert_eq!("(98.77 KB/s)", task.calculate_speed());

        let task = create_test_task("seeding", json!({"speed_download": 0, "speed_upload": 45678}));
        assert_eq!("(45.68 KB/s)", task.calculate_speed());

        let task = create_test_task("paused", json!({"speed_download": 98765}));
        assert_eq!("", task.calculate_speed());
    }

    #[test]
    fn test_calculate_time_left() {
        let task = create_test_task("downloading", json!({"speed_download": 98765}));
        assert_eq!("⏳Time left: 3 h 28 m", task.calculate_time_left());

        let stalled = create_test_task("downloading", json!({}));
        assert_eq!("⏳Time left: Unknown", stalled.calculate_time_left());

        let finished = create_test_task("finished", json!({"speed_download": 98765}));
        assert_eq!("", finished.calculate_time_left());
    }

    #[test]
    fn test_convert_time_left() {
        assert_eq!("Unknown", convert_time_left(-1));
        assert_eq!("59 s", convert_time_left(59));
        assert_eq!("1 m 1 s", convert_time_left(61));
        assert_eq!("1 d 1 h 1 m", convert_time_left(90_060));
    }
}
