//! Narrative page registry.
//!
//! The dashboard's static pages: introduction, dataset description, analysis
//! overview and conclusion. Pages are registered by id; the Dataset page
//! additionally embeds the E/R diagram PDF from the data directory when the
//! file exists, and degrades to an inline warning when it does not.

use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use common::errors::{AppError, AppResult};
use common::models::page::{EmbeddedDocument, PageContent, PageSummary};

use crate::pipeline;

const ER_DIAGRAM_FILE: &str = "er_diagram.pdf";

/// Serves the narrative pages.
pub struct PageRegistry {
    data_dir: PathBuf,
}

impl PageRegistry {
    /// Creates a registry reading embeds from the given data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Lists the registered pages in navigation order.
    pub fn list(&self) -> Vec<PageSummary> {
        [
            ("introduction", "Introduction & Motivation"),
            ("dataset", "Dataset & Data Management"),
            ("analysis", "Data Analysis & Interpretation"),
            ("conclusion", "Project Conclusion"),
        ]
        .iter()
        .map(|(id, title)| PageSummary {
            id: id.to_string(),
            title: title.to_string(),
        })
        .collect()
    }

    /// Renders a page by id.
    pub fn render(&self, id: &str) -> AppResult<PageContent> {
        match id {
            "introduction" => Ok(introduction()),
            "dataset" => Ok(self.dataset()),
            "analysis" => Ok(analysis()),
            "conclusion" => Ok(conclusion()),
            _ => Err(AppError::MissingResource(format!("page not found: {}", id))),
        }
    }

    fn dataset(&self) -> PageContent {
        let mut page = PageContent {
            id: "dataset".to_string(),
            title: "Dataset & Data Management".to_string(),
            body: DATASET_BODY.to_string(),
            document: None,
            warnings: vec![],
        };

        let path = self.data_dir.join(ER_DIAGRAM_FILE);
        match std::fs::read(&path) {
            Ok(bytes) => {
                page.document = Some(EmbeddedDocument {
                    file_name: ER_DIAGRAM_FILE.to_string(),
                    media_type: "application/pdf".to_string(),
                    content_base64: STANDARD.encode(bytes),
                });
            }
            Err(_) => {
                tracing::warn!(path = %path.display(), "E/R diagram PDF not found");
                page.warnings.push(
                    "E/R diagram PDF not found. Check the path or file name.".to_string(),
                );
            }
        }
        page
    }
}

fn introduction() -> PageContent {
    PageContent {
        id: "introduction".to_string(),
        title: "Introduction & Motivation".to_string(),
        body: INTRODUCTION_BODY.to_string(),
        document: None,
        warnings: vec![],
    }
}

fn analysis() -> PageContent {
    let tabs = pipeline::TABS
        .iter()
        .map(|spec| format!("- **{}**: {}", spec.title, spec.description))
        .collect::<Vec<_>>()
        .join("\n");

    PageContent {
        id: "analysis".to_string(),
        title: "Data Analysis & Interpretation".to_string(),
        body: format!("{}\n\n{}", ANALYSIS_BODY, tabs),
        document: None,
        warnings: vec![],
    }
}

fn conclusion() -> PageContent {
    PageContent {
        id: "conclusion".to_string(),
        title: "Project Conclusion".to_string(),
        body: CONCLUSION_BODY.to_string(),
        document: None,
        warnings: vec![],
    }
}

const INTRODUCTION_BODY: &str = r#"### Background

Rear-end collisions are among the most frequent types of highway accidents,
often influenced by factors such as road surface conditions, driver behavior,
vehicle characteristics, and traffic volumes.

Over the past decade, Washington State freeways have seen a variety of weather
patterns and traffic demands, making them ideal for exploring how factors like
**road surface (wet vs. dry)**, **speed limits**, and **driver age groups**
affect collision frequency and severity.

### Why This Matters

By identifying key predictors of rear-end collisions, we can:

- Inform roadway design improvements (e.g., variable speed limits, better signage).
- Develop targeted driver education (especially for younger motorists).
- Optimize traffic control measures (ramp metering, dynamic message signs, etc.).

Our goal is to present these findings in an accessible way, allowing
stakeholders to easily explore the data and glean insights for policy and
design decisions."#;

const DATASET_BODY: &str = r#"### Dataset Overview

We used the HSIS dataset for major Washington State freeways (I-5, I-90,
I-405, SR-520), containing details on:

- **Accidents** (date, time, weather, location)
- **Roadway features** (speed limits, AADT, surface conditions)
- **Vehicles & Drivers** (type, age, impairment)

**Size**: several hundred thousand collision records across multiple years.

### Limitations

1. Missing or erroneous records (unknown driver ages, incomplete weather data).
2. Differences in data dictionaries between 2002 and 2013-2017, requiring standardization.
3. Freeways might not be equally represented in each year (potential bias).

### Data Storage & Management

- Hosted on a relational database server for robust queries and concurrent access.
- SQL scripts used to import raw HSIS data.
- Backups performed bi-weekly to mitigate data loss.
- Anomalies (e.g., duplicates) flagged and addressed prior to analysis.

Our structure follows BCNF, ensuring minimal redundancy and efficient queries."#;

const ANALYSIS_BODY: &str = r#"Connect a session to the collision database, then load each analysis tab to
compare collision counts side by side:"#;

const CONCLUSION_BODY: &str = r#"## Key Takeaways

- **Wet roads** see higher collision counts, especially in certain conditions.
- **High speed limits** correlate with more severe rear-end collisions.
- **Younger drivers** (under 25) appear overrepresented in collisions under
  certain crash rate categories.

## Recommendations

1. **Adaptive Speed Limits**: Implement variable or adaptive limits during wet weather.
2. **Targeted Driver Education**: Additional training and awareness for younger drivers.
3. **Data-Driven Policy**: Use real-time traffic and weather data to warn drivers about potential hazards.

## Next Steps

- Expand the analysis to more freeways or additional years of data.
- Investigate the impact of roadway geometry (curve radius, grade) on collisions.
- Explore real-time data integration (e.g., WSDOT traffic sensors)."#;

#[cfg(test)]
mod tests {
    use super::*;
    use common::utils::IdGenerator;

    #[test]
    fn test_lists_pages_in_navigation_order() {
        let registry = PageRegistry::new("data");
        let ids: Vec<String> = registry.list().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["introduction", "dataset", "analysis", "conclusion"]);
    }

    #[test]
    fn test_unknown_page_is_an_error() {
        let registry = PageRegistry::new("data");
        assert!(registry.render("appendix").is_err());
    }

    #[test]
    fn test_analysis_page_lists_every_tab() {
        let registry = PageRegistry::new("data");
        let page = registry.render("analysis").unwrap();
        for spec in &pipeline::TABS {
            assert!(page.body.contains(spec.title));
        }
    }

    #[test]
    fn test_dataset_without_pdf_warns_instead_of_failing() {
        let registry = PageRegistry::new("/nonexistent-data-dir");
        let page = registry.render("dataset").unwrap();

        assert!(page.document.is_none());
        assert_eq!(page.warnings.len(), 1);
        assert!(page.warnings[0].contains("not found"));
    }

    #[test]
    fn test_dataset_embeds_pdf_when_present() {
        let dir = std::env::temp_dir().join(format!("dashboard-{}", IdGenerator::session_id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(ER_DIAGRAM_FILE), b"%PDF-1.4 test").unwrap();

        let registry = PageRegistry::new(&dir);
        let page = registry.render("dataset").unwrap();

        let document = page.document.expect("document should be embedded");
        assert_eq!(document.media_type, "application/pdf");
        assert_eq!(
            STANDARD.decode(document.content_base64).unwrap(),
            b"%PDF-1.4 test"
        );
        assert!(page.warnings.is_empty());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
