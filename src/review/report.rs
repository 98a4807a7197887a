use crate::models::{AnalysisRecord, AnalysisResponse, RepositoryRef, RepositorySummary};
use chrono::Utc;

/// Combines repository metadata, the parsed record and the raw answer into the final response
pub fn assemble(
    repo: &RepositoryRef,
    languages: Vec<String>,
    files_analyzed: usize,
    analysis: AnalysisRecord,
    raw_review: String,
) -> AnalysisResponse {
    AnalysisResponse {
        repository: RepositorySummary {
            name: repo.full_name(),
            url: repo.url.clone(),
            languages,
            total_files_analyzed: files_analyzed,
        },
        analysis,
        raw_review,
        timestamp: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImprovementItem, StrengthItem};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_assemble_and_json_round_trip() {
        let record = AnalysisRecord {
            overall_score: 85,
            summary: "Good code.".into(),
            strengths: vec![StrengthItem {
                title: "Clear naming".into(),
                description: "variables are descriptive".into(),
            }],
            improvements: vec![ImprovementItem {
                title: "Error handling".into(),
                score: "6/10".into(),
                issue: "missing try/catch".into(),
                action: "add error handling".into(),
            }],
            ..AnalysisRecord::default()
        };
        let repo = RepositoryRef::new("octocat", "Hello-World");
        let before = Utc::now();

        let response = assemble(&repo, vec!["Python".into()], 3, record.clone(), "raw".into());

        assert_eq!(response.repository.name, "octocat/Hello-World");
        assert_eq!(response.repository.url, "https://github.com/octocat/Hello-World");
        assert_eq!(response.repository.total_files_analyzed, 3);
        assert_eq!(response.analysis, record);
        assert!(response.timestamp >= before);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["analysis"]["overall_score"], 85);
        assert_eq!(json["analysis"]["improvements"][0]["score"], "6/10");
        assert_eq!(json["analysis"]["code_examples"]["before"], "");
        assert_eq!(json["repository"]["languages"][0], "Python");
        assert!(json["timestamp"].as_str().unwrap().contains('T'));

        let back: AnalysisResponse = serde_json::from_value(json).unwrap();
        assert_eq!(back, response);
    }
}
