//! Best-effort forwarding of accepted tasks to a card printer.
//!
//! # Responsibility
//! - Define the `PrinterService` contract used after a task is stored.
//! - Derive the card fields shown for a task.
//! - Provide a plain-text card printer for terminals and logs.
//!
//! # Invariants
//! - Printing never affects what was stored.

use crate::model::task::TaskRecord;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Write;
use std::sync::Mutex;

const CARD_WIDTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintError {
    pub message: String,
}

impl PrintError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for PrintError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "printing failed: {}", self.message)
    }
}

impl Error for PrintError {}

/// Renders and prints one stored task.
pub trait PrinterService {
    fn render_and_print(&self, task: &TaskRecord) -> Result<(), PrintError>;
}

/// Fields shown on a printed task card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCard {
    pub title: String,
    pub priority: &'static str,
    /// Due date text, `Today` when the task has none.
    pub due: String,
    /// List name, `Default` when the task has none.
    pub list: String,
}

impl TaskCard {
    pub fn from_record(record: &TaskRecord) -> Self {
        Self {
            title: record.name.clone(),
            priority: record.priority.label(),
            due: record
                .due_date
                .clone()
                .unwrap_or_else(|| "Today".to_string()),
            list: record
                .list_name
                .clone()
                .unwrap_or_else(|| "Default".to_string()),
        }
    }

    pub fn render_text(&self) -> String {
        let rule = "=".repeat(CARD_WIDTH);
        format!(
            "{rule}\n{}\n{rule}\nPriority: {}\nDue:      {}\nList:     {}\n{rule}\n",
            self.title, self.priority, self.due, self.list
        )
    }
}

/// Writes plain-text cards to any writer.
pub struct TextCardPrinter<W: Write> {
    out: Mutex<W>,
}

impl<W: Write> TextCardPrinter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write> PrinterService for TextCardPrinter<W> {
    fn render_and_print(&self, task: &TaskRecord) -> Result<(), PrintError> {
        let card = TaskCard::from_record(task).render_text();
        let mut out = self
            .out
            .lock()
            .map_err(|_| PrintError::new("printer output lock poisoned"))?;
        out.write_all(card.as_bytes())
            .and_then(|()| out.flush())
            .map_err(|err| PrintError::new(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{PrinterService, TaskCard, TextCardPrinter};
    use crate::model::task::{ExtractedTask, Priority, TaskRecord};
    use chrono::Utc;

    fn record(task: ExtractedTask) -> TaskRecord {
        TaskRecord::from_extracted(task, Utc::now()).unwrap()
    }

    #[test]
    fn card_falls_back_to_today_and_default_list() {
        let card = TaskCard::from_record(&record(ExtractedTask::new("Buy milk", Priority::Low)));
        assert_eq!(card.priority, "LOW");
        assert_eq!(card.due, "Today");
        assert_eq!(card.list, "Default");
    }

    #[test]
    fn text_printer_writes_card_fields() {
        let task = ExtractedTask::new("Call dentist", Priority::High)
            .with_due_date("2026-11-02T09:30:00")
            .with_list_name("Personal");
        let printer = TextCardPrinter::new(Vec::new());
        printer.render_and_print(&record(task)).unwrap();

        let output = String::from_utf8(printer.into_inner()).unwrap();
        assert!(output.contains("Call dentist"));
        assert!(output.contains("Priority: HIGH"));
        assert!(output.contains("Due:      2026-11-02T09:30:00"));
        assert!(output.contains("List:     Personal"));
    }
}
