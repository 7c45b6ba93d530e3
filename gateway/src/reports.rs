//! 预定义报表目录
//!
//! Each report is a fixed, read-only query bound to one database selector.

use common::models::ReportSummary;

/// A named, predefined query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportDefinition {
    pub database: &'static str,
    pub id: &'static str,
    pub title: &'static str,
    pub sql: &'static str,
}

const BUILTIN_REPORTS: &[ReportDefinition] = &[
    ReportDefinition {
        database: "university",
        id: "student-courses",
        title: "Student Course Enrollments",
        sql: "SELECT s.Name AS Student, c.Title AS Course, e.Grade, ad.Name AS Department \
              FROM Student s \
              JOIN Enrolled_In e ON s.Name = e.Name AND s.DOB = e.DOB \
              JOIN Course c ON e.Title = c.Title AND e.Year = c.Year \
              JOIN Academic_Department ad ON c.Department_Name = ad.Name",
    },
    ReportDefinition {
        database: "university",
        id: "department-summary",
        title: "Courses Offered per Department",
        sql: "SELECT ad.Name AS Department, COUNT(c.Title) AS Courses_Offered \
              FROM Academic_Department ad \
              LEFT JOIN Course c ON c.Department_Name = ad.Name \
              GROUP BY ad.Name \
              ORDER BY ad.Name",
    },
    ReportDefinition {
        database: "research",
        id: "journal-summary",
        title: "Journal Publication Summary",
        sql: "SELECT j.Title AS Journal, j.Volume, COUNT(p.Title) AS Publications \
              FROM Journal j \
              LEFT JOIN Publication p ON p.Journal_Title = j.Title AND p.Journal_Volume = j.Volume \
              GROUP BY j.Title, j.Volume \
              ORDER BY j.Title, j.Volume",
    },
    ReportDefinition {
        database: "research",
        id: "researcher-publications",
        title: "Publications per Researcher",
        sql: "SELECT r.Name AS Researcher, l.Name AS Lab, COUNT(a.Publication_Title) AS Publications \
              FROM Researcher r \
              LEFT JOIN Lab l ON r.Lab_Name = l.Name \
              LEFT JOIN Authored_By a ON a.Researcher_Name = r.Name \
              GROUP BY r.Name, l.Name \
              ORDER BY Publications DESC, r.Name",
    },
];

/// Static report catalog.
#[derive(Debug, Clone)]
pub struct ReportCatalog {
    reports: &'static [ReportDefinition],
}

impl ReportCatalog {
    pub fn builtin() -> Self {
        Self {
            reports: BUILTIN_REPORTS,
        }
    }

    /// Catalog entries for a selector; empty when it has no reports.
    pub fn list(&self, database: &str) -> Vec<ReportSummary> {
        self.reports
            .iter()
            .filter(|r| r.database == database)
            .map(|r| ReportSummary {
                id: r.id.to_string(),
                title: r.title.to_string(),
            })
            .collect()
    }

    pub fn get(&self, database: &str, id: &str) -> Option<&ReportDefinition> {
        self.reports
            .iter()
            .find(|r| r.database == database && r.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_list_per_database() {
        let catalog = ReportCatalog::builtin();
        let ids: Vec<String> = catalog.list("research").into_iter().map(|r| r.id).collect();
        assert_eq!(ids, ["journal-summary", "researcher-publications"]);
        assert!(catalog.list("library").is_empty());
    }

    #[test]
    fn test_get_is_scoped_to_database() {
        let catalog = ReportCatalog::builtin();
        assert!(catalog.get("research", "journal-summary").is_some());
        assert!(catalog.get("university", "journal-summary").is_none());
    }

    #[test]
    fn test_ids_unique_per_database() {
        let catalog = ReportCatalog::builtin();
        let keys: HashSet<(&str, &str)> = BUILTIN_REPORTS.iter().map(|r| (r.database, r.id)).collect();
        assert_eq!(keys.len(), BUILTIN_REPORTS.len());
        assert_eq!(catalog.list("university").len() + catalog.list("research").len(), keys.len());
    }

    #[test]
    fn test_reports_are_read_only() {
        for report in BUILTIN_REPORTS {
            assert!(report.sql.starts_with("SELECT"), "{}", report.id);
        }
    }
}
