use std::time::Duration;

use reqwest::Client;
use serde_json::Value as JsonValue;

use crate::dto::analysis_dto::{
    AnalysisResult, CourseSuggestion, DetailedAnalysis, DevelopmentRoadmap, ProjectSuggestion,
    SuggestedJob,
};
use crate::error::{Error, Result};

const FALLBACK_JOB_PROVIDER: &str = "Công ty đối tác";
const FALLBACK_COURSE_PROVIDER: &str = "Nền tảng học tập";
const GENERAL_TARGET_LABEL: &str = "Đánh giá tổng quát";

const SYSTEM_PROMPT: &str = r#"Bạn là Voltria, một Chuyên gia Tuyển dụng AI cao cấp. Mục tiêu của bạn là phân tích sâu CV và đưa ra phản hồi có cấu trúc.

**QUAN TRỌNG:** TẤT CẢ NỘI DUNG TRẢ LỜI PHẢI BẰNG TIẾNG VIỆT.

**Quy tắc phân tích:**
1. **Tóm tắt & Đánh giá:** Phân tích Kinh nghiệm, Kỹ năng, Ổn định, Khoảng trống.
2. **Lộ trình phát triển (Roadmap):** Đề xuất lộ trình 3 giai đoạn: nâng cao kiến thức (khóa học cụ thể), thực hành & xây dựng portfolio (dự án cá nhân), cơ hội nghề nghiệp (vị trí tại loại hình công ty cụ thể).

**Yêu cầu đầu ra:**
Trả về JSON hợp lệ. Văn phong chuyên nghiệp, khích lệ."#;

fn user_prompt(target_job: &str) -> String {
    let target = {
        let trimmed = target_job.trim();
        if trimmed.is_empty() {
            GENERAL_TARGET_LABEL
        } else {
            trimmed
        }
    };
    format!(
        r#"Vị trí công việc mục tiêu: {}

Hãy phân tích CV đính kèm (PDF hoặc hình ảnh) và tạo lộ trình phát triển. CHỈ trả về JSON hợp lệ, không có text nào khác.

**YÊU CẦU BẮT BUỘC:**
1. candidateLevel: "Junior" | "Middle" | "Senior" | "Expert"
2. matchScore: số nguyên từ 0-100
3. strengths và weaknesses: mảng ít nhất 3-5 chuỗi
4. detailedAnalysis: object với 7 trường bắt buộc (mỗi trường 40-80 từ)
5. suggestedJobs: mảng ít nhất 2 items, mỗi item có "title", "description", "provider"
6. developmentRoadmap: object với 2 mảng (courses, projects), mỗi mảng 2-3 items
7. aiAgentReview: nhận xét chân thật về cách trình bày CV (60-100 từ)

**SCHEMA:**
{{
  "candidateLevel": "string",
  "summary": "string",
  "matchScore": number,
  "strengths": ["string"],
  "weaknesses": ["string"],
  "detailedAnalysis": {{
    "experienceMatch": "string",
    "skillsAssessment": "string",
    "jobStability": "string",
    "employmentGaps": "string",
    "progressionAndAwards": "string",
    "teamworkAndSoftSkills": "string",
    "proactivity": "string"
  }},
  "suggestedJobs": [{{"title": "string", "description": "string", "provider": "string"}}],
  "developmentRoadmap": {{
    "courses": [{{"name": "string", "provider": "string", "description": "string"}}],
    "projects": [{{"name": "string", "description": "string"}}]
  }},
  "aiAgentReview": "string"
}}"#,
        target
    )
}

#[derive(Clone)]
pub struct AnalysisService {
    client: Client,
    api_key: String,
}

impl AnalysisService {
    pub fn new(api_key: String, client: Client) -> Self {
        Self { client, api_key }
    }

    /// Runs the CV through the analysis model. Any failure surfaces as a
    /// single human-readable error; nothing is retried.
    pub async fn analyze(
        &self,
        cv_base64: &str,
        mime_type: &str,
        target_job: &str,
    ) -> Result<AnalysisResult> {
        let content: Vec<JsonValue> = vec![
            serde_json::json!({
                "type": "text",
                "text": user_prompt(target_job)
            }),
            serde_json::json!({
                "type": "image_url",
                "image_url": {
                    "url": format!("data:{};base64,{}", mime_type, cv_base64),
                    "detail": "high"
                }
            }),
        ];

        let payload = serde_json::json!({
            "model": "gpt-4o",
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": content}
            ],
            "response_format": { "type": "json_object" }
        });

        let raw = self.chat_openai(payload).await?;
        let result = sanitize_analysis(&raw)?;
        tracing::info!(match_score = result.match_score, "CV analysis complete");
        Ok(result)
    }

    async fn chat_openai(&self, payload: JsonValue) -> Result<JsonValue> {
        let res = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&payload)
            .timeout(Duration::from_secs(120))
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(Error::Analysis(format!("OpenAI API Error {}: {}", status, text)));
        }

        let body: JsonValue = res.json().await?;

        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .and_then(|s| serde_json::from_str(s).ok())
            .ok_or_else(|| Error::Analysis("Không nhận được phản hồi từ OpenAI".to_string()))
    }
}

/// Validates the model reply against the product schema and applies the
/// documented list defaults. Error messages name the missing field.
fn sanitize_analysis(raw: &JsonValue) -> Result<AnalysisResult> {
    let candidate_level = field_str(raw, "candidateLevel")?;
    let summary = field_str(raw, "summary")?;
    let match_score = raw
        .get("matchScore")
        .and_then(|v| v.as_i64())
        .and_then(|v| i32::try_from(v).ok())
        .filter(|score| (0..=100).contains(score))
        .ok_or_else(|| missing("matchScore"))?;
    let strengths = field_str_array(raw, "strengths")?;
    let weaknesses = field_str_array(raw, "weaknesses")?;

    let detailed = raw
        .get("detailedAnalysis")
        .filter(|v| v.is_object())
        .ok_or_else(|| missing("detailedAnalysis"))?;
    let detailed_analysis = DetailedAnalysis {
        experience_match: detail_str(detailed, "experienceMatch")?,
        skills_assessment: detail_str(detailed, "skillsAssessment")?,
        job_stability: detail_str(detailed, "jobStability")?,
        employment_gaps: detail_str(detailed, "employmentGaps")?,
        progression_and_awards: detail_str(detailed, "progressionAndAwards")?,
        teamwork_and_soft_skills: detail_str(detailed, "teamworkAndSoftSkills")?,
        proactivity: detail_str(detailed, "proactivity")?,
    };

    let suggested_jobs = raw
        .get("suggestedJobs")
        .and_then(|v| v.as_array())
        .map(|jobs| {
            jobs.iter()
                .map(|job| SuggestedJob {
                    title: str_or_empty(job, "title"),
                    description: str_or_empty(job, "description"),
                    provider: str_or_default(job, "provider", FALLBACK_JOB_PROVIDER),
                })
                .collect()
        })
        .unwrap_or_default();

    let roadmap = raw
        .get("developmentRoadmap")
        .filter(|v| v.is_object())
        .ok_or_else(|| missing("developmentRoadmap"))?;
    let courses_raw = roadmap.get("courses").and_then(|v| v.as_array());
    let projects_raw = roadmap.get("projects").and_then(|v| v.as_array());
    let (Some(courses_raw), Some(projects_raw)) = (courses_raw, projects_raw) else {
        return Err(Error::Analysis(
            "Response thiếu developmentRoadmap arrays".to_string(),
        ));
    };

    let development_roadmap = DevelopmentRoadmap {
        courses: courses_raw
            .iter()
            .map(|course| CourseSuggestion {
                name: str_or_empty(course, "name"),
                provider: str_or_default(course, "provider", FALLBACK_COURSE_PROVIDER),
                description: str_or_empty(course, "description"),
            })
            .collect(),
        projects: projects_raw
            .iter()
            .map(|project| ProjectSuggestion {
                name: str_or_empty(project, "name"),
                description: str_or_empty(project, "description"),
            })
            .collect(),
    };

    let ai_agent_review = raw
        .get("aiAgentReview")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("Dựa trên phân tích CV, {}", summary));

    Ok(AnalysisResult {
        candidate_level,
        summary,
        match_score,
        strengths,
        weaknesses,
        detailed_analysis,
        suggested_jobs,
        development_roadmap,
        ai_agent_review,
    })
}

fn missing(field: &str) -> Error {
    Error::Analysis(format!(
        "Response không đúng format - thiếu trường: {}",
        field
    ))
}

fn field_str(raw: &JsonValue, field: &str) -> Result<String> {
    raw.get(field)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .ok_or_else(|| missing(field))
}

fn field_str_array(raw: &JsonValue, field: &str) -> Result<Vec<String>> {
    let arr = raw
        .get(field)
        .and_then(|v| v.as_array())
        .ok_or_else(|| missing(field))?;
    Ok(arr
        .iter()
        .filter_map(|v| v.as_str().map(|s| s.to_string()))
        .collect())
}

fn detail_str(detailed: &JsonValue, field: &str) -> Result<String> {
    detailed
        .get(field)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            Error::Analysis(format!(
                "Response thiếu trường: detailedAnalysis.{}",
                field
            ))
        })
}

fn str_or_empty(v: &JsonValue, field: &str) -> String {
    v.get(field)
        .and_then(|x| x.as_str())
        .unwrap_or("")
        .to_string()
}

fn str_or_default(v: &JsonValue, field: &str, default: &str) -> String {
    v.get(field)
        .and_then(|x| x.as_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(default)
        .to_string()
}
