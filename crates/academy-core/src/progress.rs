//! Dashboard arithmetic over already-fetched data.

use crate::types::{AttendanceRecord, AttendanceStatus, CurriculumModule, Submission};

/// Percentage of modules marked completed, rounded. `0` when there are none.
pub fn completion_percent(modules: &[CurriculumModule]) -> u8 {
    if modules.is_empty() {
        return 0;
    }
    let done = modules.iter().filter(|m| m.completed).count();
    percent(done, modules.len())
}

/// Mean score across graded submissions. `None` when nothing is graded yet.
pub fn grade_average(submissions: &[Submission]) -> Option<f64> {
    let scores: Vec<f64> = submissions.iter().filter_map(|s| s.score).collect();
    if scores.is_empty() {
        return None;
    }
    Some(scores.iter().sum::<f64>() / scores.len() as f64)
}

/// Share of sessions attended (present or late), rounded. Excused sessions
/// are left out of the denominator. `0` when nothing counts.
pub fn attendance_rate(records: &[AttendanceRecord]) -> u8 {
    let counted: Vec<_> = records
        .iter()
        .filter(|r| r.status != AttendanceStatus::Excused)
        .collect();
    if counted.is_empty() {
        return 0;
    }
    let attended = counted
        .iter()
        .filter(|r| matches!(r.status, AttendanceStatus::Present | AttendanceStatus::Late))
        .count();
    percent(attended, counted.len())
}

fn percent(part: usize, total: usize) -> u8 {
    ((part as f64 / total as f64) * 100.0).round() as u8
}
