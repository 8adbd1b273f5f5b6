use std::env;
use std::fs;
use std::io::Write;
use std::process::Command;

/// Errors from editor operations
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("Failed to create temp file: {0}")]
    TempFileError(#[from] std::io::Error),
    #[error("Editor command failed: {0}")]
    EditorFailed(String),
    #[error("No editor found. Set $EDITOR or $VISUAL environment variable")]
    NoEditorFound,
    #[error("Empty evidence note")]
    EmptyNote,
}

/// Trait for opening an editor - allows mocking in tests
pub trait Editor {
    /// Open editor with initial content, return the edited content.
    /// The comment_help is appended as commented lines (# prefix) for guidance.
    fn edit(&self, initial: &str, comment_help: &str) -> Result<String, EditorError>;
}

/// System editor implementation - uses $EDITOR, $VISUAL, or fallbacks
pub struct SystemEditor;

impl SystemEditor {
    pub fn new() -> Self {
        Self
    }

    /// Find the editor command to use
    fn find_editor() -> Result<String, EditorError> {
        if let Ok(editor) = env::var("EDITOR") {
            return Ok(editor);
        }
        if let Ok(editor) = env::var("VISUAL") {
            return Ok(editor);
        }

        for editor in &["nano", "vim", "vi", "notepad"] {
            if Command::new("which")
                .arg(editor)
                .output()
                .map(|o| o.status.success())
                .unwrap_or(false)
            {
                return Ok(editor.to_string());
            }
        }

        Err(EditorError::NoEditorFound)
    }
}

impl Default for SystemEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor for SystemEditor {
    fn edit(&self, initial: &str, comment_help: &str) -> Result<String, EditorError> {
        let editor = Self::find_editor()?;

        let mut temp_file = tempfile::Builder::new()
            .prefix("hria-evidence-")
            .suffix(".txt")
            .tempfile()?;

        temp_file.write_all(initial.as_bytes())?;

        if !comment_help.is_empty() {
            temp_file.write_all(b"\n\n")?;
            for line in comment_help.lines() {
                temp_file.write_all(b"# ")?;
                temp_file.write_all(line.as_bytes())?;
                temp_file.write_all(b"\n")?;
            }
        }

        temp_file.flush()?;

        // NamedTempFile deletes on drop; keep only the path while the editor runs.
        let temp_path = temp_file.into_temp_path();

        // Editor command may carry args, e.g. "code --wait"
        let mut parts = editor.split_whitespace();
        let cmd = parts.next().ok_or(EditorError::NoEditorFound)?;
        let args: Vec<&str> = parts.collect();

        let status = Command::new(cmd)
            .args(&args)
            .arg(&temp_path)
            .status()
            .map_err(|e| EditorError::EditorFailed(e.to_string()))?;

        if !status.success() {
            return Err(EditorError::EditorFailed(format!(
                "Editor exited with status: {}",
                status
            )));
        }

        let content = fs::read_to_string(&temp_path)?;
        let cleaned = strip_comments(&content);

        if cleaned.trim().is_empty() {
            return Err(EditorError::EmptyNote);
        }

        Ok(cleaned)
    }
}

/// Help text shown below the evidence being edited.
pub fn evidence_help(question: &str, guidance: &str) -> String {
    let mut help = format!("คำถาม: {}\n", question);
    if !guidance.is_empty() {
        help.push_str(&format!("คำแนะนำ: {}\n", guidance));
    }
    help.push_str("บันทึกหลักฐานหรือเหตุผลประกอบคำตอบด้านบน บรรทัดที่ขึ้นต้นด้วย # จะถูกละไว้");
    help
}

/// Strip lines starting with # and normalize whitespace
fn strip_comments(content: &str) -> String {
    content
        .lines()
        .filter(|line| !line.starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
