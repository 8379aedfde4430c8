use serde::{Deserialize, Serialize};

use crate::models::activity::ActivityRecord;

/// Structured CV analysis as consumed by the frontend. Field names follow
/// the product's JSON contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub candidate_level: String,
    pub summary: String,
    pub match_score: i32,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub detailed_analysis: DetailedAnalysis,
    pub suggested_jobs: Vec<SuggestedJob>,
    pub development_roadmap: DevelopmentRoadmap,
    pub ai_agent_review: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedAnalysis {
    pub experience_match: String,
    pub skills_assessment: String,
    pub job_stability: String,
    pub employment_gaps: String,
    pub progression_and_awards: String,
    pub teamwork_and_soft_skills: String,
    pub proactivity: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestedJob {
    pub title: String,
    pub description: String,
    pub provider: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevelopmentRoadmap {
    pub courses: Vec<CourseSuggestion>,
    pub projects: Vec<ProjectSuggestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseSuggestion {
    pub name: String,
    pub provider: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSuggestion {
    pub name: String,
    pub description: String,
}

/// Returned by the analysis endpoint: the structured result plus the scan
/// activity recorded for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub analysis: AnalysisResult,
    pub activity: ActivityRecord,
}
