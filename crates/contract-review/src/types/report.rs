//! Analysis report returned by the service once a job is complete
//!
//! Field names on the wire are fixed by the service (Portuguese); the Rust
//! names are English and mapped with `serde(rename)`.

use serde::{Deserialize, Deserializer, Serialize};

/// Full analysis report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Clauses in document order
    #[serde(rename = "clausulas", default)]
    pub clauses: Vec<Clause>,
    /// Issues that apply to the whole document
    #[serde(rename = "erros_globais", default)]
    pub global_issues: Vec<GlobalIssue>,
    /// Name of the analysed file
    #[serde(rename = "nome_arquivo", default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Analysis timestamp as sent by the service
    #[serde(rename = "data_analise", default, skip_serializing_if = "Option::is_none")]
    pub analysed_at: Option<String>,
    /// Conformity findings (debug output, passed through untouched)
    #[serde(rename = "conformidades", default, skip_serializing_if = "Option::is_none")]
    pub conformities: Option<Vec<serde_json::Value>>,
}

impl Report {
    /// Total issues across clauses and the global list
    pub fn issue_count(&self) -> usize {
        self.global_issues.len() + self.clauses.iter().map(|c| c.issues.len()).sum::<usize>()
    }

    /// Find a clause by identifier
    pub fn clause(&self, id: &str) -> Option<&Clause> {
        self.clauses.iter().find(|c| c.id == id)
    }
}

/// One contractual section and its issues
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    #[serde(rename = "id_clausula", deserialize_with = "nullable_string")]
    pub id: String,
    #[serde(rename = "titulo", default, deserialize_with = "nullable_string")]
    pub title: String,
    /// Clause text exactly as it appears in the document
    #[serde(rename = "texto_original", default, deserialize_with = "nullable_string")]
    pub original_text: String,
    #[serde(rename = "erros_encontrados", default)]
    pub issues: Vec<Issue>,
}

impl Clause {
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

/// Rule violation flagged inside a clause
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "id_regra", deserialize_with = "nullable_string")]
    pub rule_id: String,
    #[serde(rename = "comentario", default, deserialize_with = "nullable_string")]
    pub comment: String,
    /// Quoted excerpt of the clause text
    #[serde(rename = "trecho_exato", default, deserialize_with = "nullable_string")]
    pub excerpt: String,
    /// Rule display name
    #[serde(rename = "nome", default, skip_serializing_if = "Option::is_none")]
    pub rule_name: Option<String>,
    /// Excerpt as marked in the revised document
    #[serde(rename = "trecho_marcado", default, skip_serializing_if = "Option::is_none")]
    pub marked_excerpt: Option<String>,
}

/// Rule violation that applies to the whole document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalIssue {
    #[serde(rename = "id_regra", deserialize_with = "nullable_string")]
    pub rule_id: String,
    #[serde(rename = "comentario", default, deserialize_with = "nullable_string")]
    pub comment: String,
}

/// `null` decodes as an empty string
fn nullable_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_wire_report() {
        let raw = json!({
            "nome_arquivo": "contrato.docx",
            "clausulas": [
                {
                    "id_clausula": "3",
                    "titulo": "Do Pagamento",
                    "texto_original": "O pagamento será feito em 30 dias.",
                    "erros_encontrados": [
                        {
                            "id_regra": "R07",
                            "comentario": "Prazo sem data de referência",
                            "trecho_exato": "em 30 dias",
                            "nome": "Prazo"
                        }
                    ]
                },
                {
                    "id_clausula": "4",
                    "titulo": "Da Rescisão",
                    "texto_original": "Rescisão com aviso prévio.",
                    "erros_encontrados": []
                }
            ],
            "erros_globais": [
                { "id_regra": "G01", "comentario": "Falta foro de eleição" }
            ]
        });

        let report: Report = serde_json::from_value(raw).unwrap();
        assert_eq!(report.clauses.len(), 2);
        assert_eq!(report.file_name.as_deref(), Some("contrato.docx"));
        assert_eq!(report.clauses[0].issues[0].excerpt, "em 30 dias");
        assert_eq!(report.clauses[0].issues[0].rule_name.as_deref(), Some("Prazo"));
        assert!(!report.clause("4").unwrap().has_issues());
        assert_eq!(report.global_issues[0].rule_id, "G01");
        assert_eq!(report.issue_count(), 2);
    }

    #[test]
    fn test_nulls_and_missing_lists() {
        let raw = json!({
            "clausulas": [
                {
                    "id_clausula": "1",
                    "titulo": "Objeto",
                    "texto_original": "texto",
                    "erros_encontrados": [
                        { "id_regra": "R01", "comentario": null, "trecho_exato": null }
                    ]
                }
            ]
        });

        let report: Report = serde_json::from_value(raw).unwrap();
        assert!(report.global_issues.is_empty());
        let issue = &report.clauses[0].issues[0];
        assert_eq!(issue.comment, "");
        assert_eq!(issue.excerpt, "");
    }

    #[test]
    fn test_serializes_wire_names() {
        let report = Report {
            clauses: vec![Clause {
                id: "1".to_string(),
                title: "Objeto".to_string(),
                original_text: "texto".to_string(),
                issues: vec![],
            }],
            ..Default::default()
        };

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["clausulas"][0]["id_clausula"], "1");
        assert!(value["erros_globais"].as_array().unwrap().is_empty());
        assert!(value.get("nome_arquivo").is_none());
    }
}
