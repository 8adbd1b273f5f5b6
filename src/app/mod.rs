use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::advisor::{Advisor, AdvisorError};
use crate::analysis::{
    analyze_with_fallback, AnalysisProvider, AnalysisRequest, AnalysisSource, ProjectInfo,
};
use crate::cli::{AnalyzeArgs, AnswerArgs, AskArgs, Command, EvidenceArgs, NewArgs, ReportArgs};
use crate::dashboard;
use crate::documents::{collect_document_texts, DocumentSource, FsDocumentSource};
use crate::editor::{evidence_help, Editor, EditorError};
use crate::models::{sector_label, Assessment, AssessmentId, AssessmentInfo, Question, SECTORS};
use crate::report::{self, export_filename, OutputFormat, PdfError, PdfOptions, Report, ReportError};
use crate::scoring;
use crate::store::{AssessmentStore, PersistencePort, StoreError};

/// Shown when the fields required for analysis are missing.
pub const INFO_INCOMPLETE: &str =
    "กรุณากรอกข้อมูลให้ครบถ้วน (รูปแบบการประเมิน, ชื่อโครงการ, สาขา)";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error(transparent)]
    Editor(#[from] EditorError),
    #[error(transparent)]
    Advisor(#[from] AdvisorError),
    #[error(transparent)]
    Pdf(#[from] PdfError),
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    User(String),
}

pub struct App<P: PersistencePort, E: Editor> {
    store: AssessmentStore<P>,
    editor: E,
    provider: Box<dyn AnalysisProvider>,
    advisor: Advisor,
    documents: Box<dyn DocumentSource>,
    pdf: PdfOptions,
}

impl<P: PersistencePort, E: Editor> App<P, E> {
    pub fn new(
        store: AssessmentStore<P>,
        editor: E,
        provider: Box<dyn AnalysisProvider>,
        advisor: Advisor,
    ) -> Self {
        Self {
            store,
            editor,
            provider,
            advisor,
            documents: Box::new(FsDocumentSource),
            pdf: PdfOptions::default(),
        }
    }

    pub fn with_pdf_options(mut self, pdf: PdfOptions) -> Self {
        self.pdf = pdf;
        self
    }

    pub fn with_documents(mut self, documents: Box<dyn DocumentSource>) -> Self {
        self.documents = documents;
        self
    }

    pub fn store(&self) -> &AssessmentStore<P> {
        &self.store
    }

    pub fn run(&mut self, command: Command) -> Result<(), AppError> {
        match command {
            Command::New(args) => self.handle_new(args).map(|_| ()),
            Command::Analyze(args) => self.handle_analyze(args),
            Command::Show { id } => self.handle_show(id),
            Command::Answer(args) => self.handle_answer(args),
            Command::Evidence(args) => self.handle_evidence(args),
            Command::Finish(args) => self.handle_finish(args),
            Command::Report(args) => self.handle_report(args),
            Command::List => self.handle_list(),
            Command::Delete { id } => self.handle_delete(id),
            Command::Dashboard => self.handle_dashboard(),
            Command::Ask(args) => self.handle_ask(args),
        }
    }

    fn handle_new(&mut self, args: NewArgs) -> Result<AssessmentId, AppError> {
        if args.sector == "help" {
            println!("{}", format_sector_list());
            return Err(AppError::User("Pick a sector id from the list above".to_string()));
        }
        if args.sector != "other" && sector_label(&args.sector).is_none() {
            return Err(AppError::User(format!(
                "Unknown sector '{}'. Use --sector help to list sector ids",
                args.sector
            )));
        }

        let info = AssessmentInfo {
            name: args.name,
            assessment_type: Some(args.assessment_type),
            sector: args.sector,
            custom_sector: args.custom_sector,
            description: args.description,
            owner: args.owner,
        };
        if !info.is_ready_for_analysis() {
            return Err(AppError::User(INFO_INCOMPLETE.to_string()));
        }

        let id = self.store.create(info)?;
        self.analyze(id, &args.documents)?;
        println!("{}", id);
        Ok(id)
    }

    fn handle_analyze(&mut self, args: AnalyzeArgs) -> Result<(), AppError> {
        let ready = self
            .require(args.id)?
            .info
            .is_ready_for_analysis();
        if !ready {
            return Err(AppError::User(INFO_INCOMPLETE.to_string()));
        }
        self.analyze(args.id, &args.documents)
    }

    /// Analyze the project and replace the assessment's questionnaire.
    fn analyze(&mut self, id: AssessmentId, documents: &[PathBuf]) -> Result<(), AppError> {
        let project = ProjectInfo::from_info(&self.require(id)?.info);
        let request = AnalysisRequest {
            project,
            document_texts: collect_document_texts(self.documents.as_ref(), documents),
        };

        info!("Analyzing \"{}\"...", request.project.name);
        let outcome = analyze_with_fallback(self.provider.as_ref(), &request);
        match &outcome.source {
            AnalysisSource::Provider(label) => debug!("Analysis produced by {}", label),
            AnalysisSource::Fallback(_) => {
                warn!("ไม่สามารถวิเคราะห์ด้วย AI ได้ ใช้ชุดคำถามมาตรฐานแทน")
            }
        }

        let pruned = self.store.apply_analysis(id, &outcome.result)?;
        if pruned > 0 {
            info!("Removed {} answers for questions no longer asked", pruned);
        }

        let orphaned = self.require(id)?.orphaned_answer_ids().len();
        if orphaned > 0 {
            debug!("{} answers kept for questions no longer asked", orphaned);
        }

        info!(
            "Generated {} questions, {} risks, {} positive impacts",
            outcome.result.questions.len(),
            outcome.result.risks.len(),
            outcome.result.positive_impacts.len()
        );
        Ok(())
    }

    fn handle_show(&self, id: AssessmentId) -> Result<(), AppError> {
        print!("{}", format_questionnaire(self.require(id)?));
        Ok(())
    }

    fn handle_answer(&mut self, args: AnswerArgs) -> Result<(), AppError> {
        let question = resolve_question(self.require(args.id)?, &args.question)?.clone();

        let evidence = if args.edit {
            Some(self.edit_evidence(args.id, &question)?)
        } else {
            args.evidence
        };

        let score = self
            .store
            .set_answer(args.id, &question.id, args.answer.value())?;
        if let Some(text) = evidence {
            self.store.set_evidence(args.id, &question.id, &text)?;
        }

        info!("{}: {}", question.text, score.label());
        let has_evidence = self
            .store
            .get_evidence(args.id, &question.id)?
            .is_some_and(|e| !e.trim().is_empty());
        if score.expects_evidence() && !has_evidence {
            warn!(
                "Consider recording evidence: hria evidence {} {}",
                args.id, question.id
            );
        }
        Ok(())
    }

    fn handle_evidence(&mut self, args: EvidenceArgs) -> Result<(), AppError> {
        let question = resolve_question(self.require(args.id)?, &args.question)?.clone();
        let text = match args.text {
            Some(text) => text,
            None => self.edit_evidence(args.id, &question)?,
        };
        self.store.set_evidence(args.id, &question.id, &text)?;
        info!("Saved evidence for {}", question.id);
        Ok(())
    }

    fn edit_evidence(&self, id: AssessmentId, question: &Question) -> Result<String, AppError> {
        let current = self
            .store
            .get_evidence(id, &question.id)?
            .unwrap_or_default()
            .to_string();
        Ok(self
            .editor
            .edit(&current, &evidence_help(&question.text, &question.guidance))?)
    }

    fn handle_finish(&mut self, args: ReportArgs) -> Result<(), AppError> {
        let report = self.store.finish(args.id)?;
        info!(
            "Assessment {} completed ({}%)",
            args.id, report.completion_rate
        );
        emit_report(&report, args.format, args.output.as_deref(), &self.pdf)
    }

    fn handle_report(&self, args: ReportArgs) -> Result<(), AppError> {
        let report = self.store.report(args.id)?;
        emit_report(&report, args.format, args.output.as_deref(), &self.pdf)
    }

    fn handle_list(&self) -> Result<(), AppError> {
        let assessments = self.store.list();
        if assessments.is_empty() {
            info!("No assessments yet. Create one with: hria new");
            return Ok(());
        }
        for assessment in assessments {
            println!("{}", format_list_line(assessment));
        }
        Ok(())
    }

    fn handle_delete(&mut self, id: AssessmentId) -> Result<(), AppError> {
        self.store.delete(id)?;
        Ok(())
    }

    fn handle_dashboard(&self) -> Result<(), AppError> {
        let summary = dashboard::summarize(self.store.list());
        print!("{}", dashboard::format_summary(&summary));
        Ok(())
    }

    fn handle_ask(&self, args: AskArgs) -> Result<(), AppError> {
        let context = match args.assessment {
            Some(id) => Some(&self.require(id)?.info),
            None => None,
        };
        let reply = self.advisor.ask(&args.message, context)?;
        println!("{}", reply);
        Ok(())
    }

    fn require(&self, id: AssessmentId) -> Result<&Assessment, AppError> {
        self.store
            .get(id)
            .ok_or(AppError::Store(StoreError::NotFound(id)))
    }
}

/// Find a question by id, or by its 1-based position in the questionnaire.
fn resolve_question<'a>(
    assessment: &'a Assessment,
    selector: &str,
) -> Result<&'a Question, AppError> {
    if let Some(question) = assessment.question(selector) {
        return Ok(question);
    }
    selector
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| assessment.questions.get(i))
        .ok_or_else(|| {
            AppError::User(format!(
                "No question '{}' in assessment {}",
                selector, assessment.id
            ))
        })
}

/// Print `report`, or write it to `output` (a file, or a directory that
/// receives the export file name). PDF always goes to a file and falls
/// back to the export file name in the working directory.
fn emit_report(
    report: &Report,
    format: OutputFormat,
    output: Option<&Path>,
    pdf: &PdfOptions,
) -> Result<(), AppError> {
    let path = match output {
        Some(path) if path.is_dir() => path.join(export_filename(report, format)),
        Some(path) => path.to_path_buf(),
        None if format.is_text() => {
            println!("{}", report::render(report, format));
            return Ok(());
        }
        None => PathBuf::from(export_filename(report, format)),
    };

    fs::write(&path, report::export(report, format, pdf)?)?;
    info!("Wrote {}", path.display());
    Ok(())
}

fn format_sector_list() -> String {
    let mut output = String::from("Sectors:\n");
    for (id, label) in SECTORS {
        output.push_str(&format!("  {:<14} {}\n", id, label));
    }
    output
}

fn format_list_line(assessment: &Assessment) -> String {
    let card = scoring::score(&assessment.questions, &assessment.answers);
    format!(
        "{}  {:<10} {:>3}%  {}  {}",
        assessment.id,
        if assessment.completed {
            "completed"
        } else {
            "draft"
        },
        card.completion_rate,
        assessment.last_updated.format("%Y-%m-%d %H:%M"),
        assessment.info.name
    )
}

fn format_questionnaire(assessment: &Assessment) -> String {
    let mut output = format!("{} [{}]\n", assessment.info.name, assessment.id);
    if let Some(kind) = assessment.info.assessment_type {
        output.push_str(&format!(
            "{} | สาขา: {}\n",
            kind.label(),
            assessment.info.sector_text()
        ));
    }

    if assessment.questions.is_empty() {
        output.push_str("\nยังไม่มีคำถาม เรียก hria analyze เพื่อสร้างแบบประเมิน\n");
        return output;
    }

    let card = scoring::score(&assessment.questions, &assessment.answers);
    output.push_str(&format!(
        "ตอบแล้ว {}/{} | คะแนน {}%\n",
        card.counts.answered(),
        card.counts.total,
        card.completion_rate
    ));

    let mut current_category: Option<&str> = None;
    for (i, question) in assessment.questions.iter().enumerate() {
        if current_category != Some(question.category.as_str()) {
            output.push_str(&format!("\n## {}\n", question.category));
            current_category = Some(question.category.as_str());
        }

        let mark = assessment
            .answers
            .score(&question.id)
            .map(|s| s.label())
            .unwrap_or("-");
        output.push_str(&format!(
            "{:>3}. [{}] {}  ({})\n",
            i + 1,
            mark,
            question.text,
            question.id
        ));
        if !question.guidance.is_empty() {
            output.push_str(&format!("     คำแนะนำ: {}\n", question.guidance));
        }
        if !question.risk_warning.is_empty() {
            output.push_str(&format!("     ข้อควรระวัง: {}\n", question.risk_warning));
        }
        if let Some(evidence) = assessment.answers.evidence(&question.id) {
            output.push_str(&format!("     หลักฐาน: {}\n", evidence));
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tempfile::TempDir;

    use super::*;
    use crate::analysis::policy::OrderedFallback;
    use crate::analysis::{AnalysisError, AnalysisResult, OfflineProvider};
    use crate::answers::Score;
    use crate::documents::DocumentError;
    use crate::editor::test_support::ScriptedEditor;
    use crate::models::AssessmentType;
    use crate::store::MemoryPersistence;

    struct FixedProvider(AnalysisResult);

    impl AnalysisProvider for FixedProvider {
        fn analyze(
            &self,
            _request: &AnalysisRequest,
        ) -> Result<(AnalysisResult, String), AnalysisError> {
            Ok((self.0.clone(), "fixed".to_string()))
        }
    }

    struct NoDocuments;

    impl DocumentSource for NoDocuments {
        fn extract_text(&self, path: &Path) -> Result<String, DocumentError> {
            Err(DocumentError::FileUnreadable {
                path: path.to_path_buf(),
                reason: "not in tests".to_string(),
            })
        }
    }

    fn rights_result() -> AnalysisResult {
        AnalysisResult {
            questions: vec![
                Question::new("q1", "สิทธิ", "มีการรับฟังความคิดเห็น ใช่หรือไม่"),
                Question::new("q2", "สิทธิ", "มีการชดเชย ใช่หรือไม่").with_guidance("ดูแผนชดเชย"),
            ],
            ..AnalysisResult::default()
        }
    }

    fn app_with(
        provider: Box<dyn AnalysisProvider>,
        note: &str,
    ) -> App<MemoryPersistence, ScriptedEditor> {
        let store = AssessmentStore::open(MemoryPersistence::new()).unwrap();
        App::new(
            store,
            ScriptedEditor {
                note: note.to_string(),
            },
            provider,
            Advisor::new(OrderedFallback::default()),
        )
        .with_documents(Box::new(NoDocuments))
    }

    fn new_args(name: &str) -> NewArgs {
        NewArgs {
            name: name.to_string(),
            assessment_type: AssessmentType::Project,
            sector: "dam".to_string(),
            custom_sector: None,
            description: String::new(),
            owner: String::new(),
            documents: Vec::new(),
        }
    }

    fn answer(id: AssessmentId, question: &str, score: Score) -> Command {
        Command::Answer(AnswerArgs {
            id,
            question: question.to_string(),
            answer: score,
            evidence: None,
            edit: false,
        })
    }

    #[test]
    fn new_creates_and_analyzes() {
        let mut app = app_with(Box::new(FixedProvider(rights_result())), "");
        let id = app.handle_new(new_args("เขื่อน")).unwrap();

        let assessment = app.store().get(id).unwrap();
        assert_eq!(assessment.questions.len(), 2);
        assert!(!assessment.completed);
    }

    #[test]
    fn new_rejects_blank_name() {
        let mut app = app_with(Box::new(FixedProvider(rights_result())), "");
        let err = app.handle_new(new_args("  ")).unwrap_err();
        assert_eq!(err.to_string(), INFO_INCOMPLETE);
        assert!(app.store().list().is_empty());
    }

    #[test]
    fn new_rejects_unknown_sector() {
        let mut app = app_with(Box::new(FixedProvider(rights_result())), "");
        let mut args = new_args("x");
        args.sector = "space".to_string();
        assert!(matches!(app.handle_new(args), Err(AppError::User(_))));
    }

    #[test]
    fn offline_provider_uses_default_questions() {
        let mut app = app_with(Box::new(OfflineProvider), "");
        let id = app.handle_new(new_args("โครงการ")).unwrap();
        assert_eq!(app.store().get(id).unwrap().questions.len(), 4);
    }

    #[test]
    fn answers_by_number_and_finishes() {
        let mut app = app_with(Box::new(FixedProvider(rights_result())), "");
        let id = app.handle_new(new_args("Dam")).unwrap();

        app.run(answer(id, "1", Score::Yes)).unwrap();
        app.run(answer(id, "q2", Score::No)).unwrap();

        let dir = TempDir::new().unwrap();
        app.run(Command::Finish(ReportArgs {
            id,
            format: OutputFormat::Json,
            output: Some(dir.path().to_path_buf()),
        }))
        .unwrap();

        let assessment = app.store().get(id).unwrap();
        assert!(assessment.completed);
        let written = fs::read_to_string(dir.path().join("HRIA_Report_Dam.json")).unwrap();
        assert!(written.contains("\"completionRate\": 50"));
    }

    #[test]
    fn report_files_are_plain_text_or_pdf() {
        let mut app = app_with(Box::new(FixedProvider(rights_result())), "");
        let id = app.handle_new(new_args("Dam")).unwrap();
        let dir = TempDir::new().unwrap();

        let text_path = dir.path().join("report.txt");
        app.run(Command::Report(ReportArgs {
            id,
            format: OutputFormat::Pretty,
            output: Some(text_path.clone()),
        }))
        .unwrap();
        let text = fs::read_to_string(&text_path).unwrap();
        assert!(text.starts_with("Dam\n"));
        assert!(!text.contains('\x1b'));

        app.run(Command::Report(ReportArgs {
            id,
            format: OutputFormat::Pdf,
            output: Some(dir.path().to_path_buf()),
        }))
        .unwrap();
        let pdf = fs::read(dir.path().join("HRIA_Report_Dam.pdf")).unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
    }

    #[test]
    fn unknown_question_is_user_error() {
        let mut app = app_with(Box::new(FixedProvider(rights_result())), "");
        let id = app.handle_new(new_args("เขื่อน")).unwrap();
        assert!(matches!(
            app.run(answer(id, "9", Score::Yes)),
            Err(AppError::User(_))
        ));
    }

    #[test]
    fn evidence_from_editor() {
        let mut app = app_with(
            Box::new(FixedProvider(rights_result())),
            "ประชุม 3 ครั้ง\n# help",
        );
        let id = app.handle_new(new_args("เขื่อน")).unwrap();
        app.run(Command::Evidence(EvidenceArgs {
            id,
            question: "q1".to_string(),
            text: None,
        }))
        .unwrap();

        assert_eq!(
            app.store().get_evidence(id, "q1").unwrap(),
            Some("ประชุม 3 ครั้ง")
        );
    }

    #[test]
    fn answer_with_inline_evidence() {
        let mut app = app_with(Box::new(FixedProvider(rights_result())), "");
        let id = app.handle_new(new_args("เขื่อน")).unwrap();
        app.run(Command::Answer(AnswerArgs {
            id,
            question: "q2".to_string(),
            answer: Score::Partial,
            evidence: Some("ชดเชยบางครัวเรือน".to_string()),
            edit: false,
        }))
        .unwrap();

        assert_eq!(app.store().get_answer(id, "q2").unwrap(), Some(Score::Partial));
        assert_eq!(
            app.store().get_evidence(id, "q2").unwrap(),
            Some("ชดเชยบางครัวเรือน")
        );
    }

    #[test]
    fn report_for_missing_assessment() {
        let app = app_with(Box::new(FixedProvider(rights_result())), "");
        let err = app
            .handle_report(ReportArgs {
                id: AssessmentId(42),
                format: OutputFormat::Pretty,
                output: None,
            })
            .unwrap_err();
        assert!(matches!(err, AppError::Report(ReportError::InvalidAssessment(_))));
    }

    #[test]
    fn delete_removes_assessment() {
        let mut app = app_with(Box::new(FixedProvider(rights_result())), "");
        let id = app.handle_new(new_args("เขื่อน")).unwrap();
        app.run(Command::Delete { id }).unwrap();
        assert!(app.store().list().is_empty());
        assert!(matches!(
            app.run(Command::Delete { id }),
            Err(AppError::Store(StoreError::NotFound(_)))
        ));
    }

    #[test]
    fn ask_without_models_reports_advisor_error() {
        let app = app_with(Box::new(OfflineProvider), "");
        let err = app
            .handle_ask(AskArgs {
                message: "FPIC คืออะไร".to_string(),
                assessment: None,
            })
            .unwrap_err();
        assert!(matches!(err, AppError::Advisor(_)));
    }

    #[test]
    fn questionnaire_groups_by_category() {
        let mut app = app_with(Box::new(FixedProvider(rights_result())), "");
        let id = app.handle_new(new_args("เขื่อน")).unwrap();
        app.run(answer(id, "q1", Score::Yes)).unwrap();

        let text = format_questionnaire(app.store().get(id).unwrap());
        assert_eq!(text.matches("## สิทธิ").count(), 1);
        assert!(text.contains("  1. [ใช่] มีการรับฟังความคิดเห็น ใช่หรือไม่  (q1)"));
        assert!(text.contains("  2. [-] มีการชดเชย"));
        assert!(text.contains("คำแนะนำ: ดูแผนชดเชย"));
        assert!(text.contains("ตอบแล้ว 1/2 | คะแนน 50%"));
    }
}
