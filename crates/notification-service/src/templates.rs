use crate::{Notice, NoticeKind};

pub struct NoticeTemplate;

impl NoticeTemplate {
    /// Single terminal line, e.g. `[x] Export Failed: Could not find ...`
    pub fn render_text(notice: &Notice) -> String {
        let marker = match &notice.kind {
            NoticeKind::ExportStarted => "[..]",
            NoticeKind::ExportSucceeded { .. } => "[ok]",
            NoticeKind::TargetNotFound | NoticeKind::GenerationFailed => "[x]",
        };
        let suffix = match &notice.kind {
            NoticeKind::ExportSucceeded { file_name } => format!(" ({})", file_name),
            _ => String::new(),
        };
        format!("{} {}: {}{}", marker, notice.title, notice.description, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_text() {
        let line = NoticeTemplate::render_text(&Notice::export_succeeded("report.pdf"));
        assert_eq!(
            line,
            "[ok] PDF Generated: Your report has been downloaded successfully. (report.pdf)"
        );

        let line = NoticeTemplate::render_text(&Notice::target_not_found());
        assert!(line.starts_with("[x] Export Failed"));
    }
}
