//! Prompt construction for project analysis.

use super::AnalysisRequest;

const ANALYST_PREAMBLE: &str = "\
You are an Expert Human Rights Impact Assessment (HRIA) Analyst with deep knowledge of:
- Universal Declaration of Human Rights (UDHR)
- International Covenant on Civil and Political Rights (ICCPR)
- International Covenant on Economic, Social and Cultural Rights (ICESCR)
- UN Guiding Principles on Business and Human Rights (UNGPs)
- ILO Core Conventions
- Environmental and social safeguards frameworks

CRITICAL: All output must be in THAI language only.
";

const ANALYSIS_RULES: &str = r#"
## Analysis Rules

1. Evidence-based analysis only. Every risk and impact must be traceable to
   the project information or documents above. Do not add generic sector risks.
2. Analyze implications, do not summarize. Explain HOW the content leads to
   each risk or benefit.
3. If the documents are insufficient, say so in the description
   ("ข้อมูลในเอกสารไม่เพียงพอสำหรับการประเมิน") and ask questions that would
   gather the missing information.
4. Severity: High when severe impacts, vulnerable groups or fundamental rights
   violations are evident; Medium for moderate concerns; Low for minor or
   temporary effects.

Rights to consider (only where the material supports them): life, liberty
and security; health; water and sanitation; food and adequate standard of
living; housing; work and fair working conditions; education; expression and
information; participation; culture; indigenous peoples; healthy environment;
property and land; privacy. Procedural rights: information and transparency,
participation and FPIC, remedy and access to justice, non-discrimination.

## Question Rules

- Generate 8-15 CLOSED-ENDED questions answerable only with ใช่, ใช่บางส่วน or ไม่ใช่.
- Every question is a specific statement ending with "ใช่หรือไม่".
- Never use the words อะไร, อะไรบ้าง, ใด, ใดบ้าง, อย่างไร, ทำไม, เพราะอะไร,
  เมื่อไหร่, ที่ไหน, ใคร, เท่าไหร่, กี่, ช่วงไหน, ประเภทใด, ลักษณะใด.
  ✅ "โครงการมีการประเมินผลกระทบต่อสิ่งแวดล้อมก่อนดำเนินการ ใช่หรือไม่"
  ❌ "โครงการส่งผลกระทบต่อชุมชนอย่างไร ใช่หรือไม่"
- Generate 3-8 actionable recommendations based on gaps in the material.

## Output Format

Respond with a single JSON object and nothing else:

{
  "risks": [
    {
      "title": "ชื่อความเสี่ยง",
      "description": "คำอธิบายพร้อมอ้างอิงข้อความจากเอกสาร",
      "severity": "High|Medium|Low",
      "rights_affected": ["สิทธิที่ได้รับผลกระทบ"],
      "document_reference": "ส่วนของเอกสารที่พบข้อมูลนี้"
    }
  ],
  "positive_impacts": [
    {
      "title": "ชื่อผลกระทบเชิงบวก",
      "description": "คำอธิบายและกลุ่มผู้รับประโยชน์",
      "document_reference": "ส่วนของเอกสารที่พบข้อมูลนี้"
    }
  ],
  "recommendations": ["ข้อเสนอแนะที่เฉพาะเจาะจง"],
  "suggested_questions": [
    {
      "category": "หมวดหมู่ของคำถาม",
      "text": "ข้อความที่เฉพาะเจาะจง ใช่หรือไม่",
      "guidance": "คำแนะนำสำหรับผู้ประเมิน",
      "riskWarning": "คำเตือนความเสี่ยง"
    }
  ],
  "document_analysis_notes": "สรุปว่าเอกสารมีข้อมูลเพียงพอหรือไม่ และมีช่องว่างอะไรบ้าง"
}
"#;

/// Builds the analysis prompt for a project and its document texts.
pub fn build_analysis_prompt(request: &AnalysisRequest) -> String {
    let project = &request.project;
    let mut prompt = String::from(ANALYST_PREAMBLE);

    prompt.push_str(&format!(
        "\n## Project Information\n\nName: {}\nType: {}\nSector: {}\nDescription: {}\n",
        project.name,
        project.assessment_type,
        project.sector,
        if project.description.trim().is_empty() {
            "ไม่มีรายละเอียด"
        } else {
            project.description.as_str()
        }
    ));

    if !request.document_texts.is_empty() {
        prompt.push_str("\n## Document Contents\n\n");
        prompt.push_str(&request.document_texts.join("\n\n"));
        prompt.push('\n');
    }

    prompt.push_str(ANALYSIS_RULES);
    prompt
}
