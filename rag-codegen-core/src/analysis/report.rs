//! Human-readable rendering and improvement suggestions

use super::{AnalysisReport, CheckOutcome};

const MAX_FUNCTIONS: usize = 10;
const MAX_BRANCHES: usize = 5;

/// Suggestions derived from completed checks, plus one line per failed check
pub fn improvement_suggestions(report: &AnalysisReport) -> Vec<String> {
    let mut suggestions = Vec::new();

    if let Some(quality) = report.quality.completed() {
        for msg in quality.messages.iter().filter(|m| m.message_type.is_problem()) {
            suggestions.push(format!(
                "Pylint {}: {} (line {})",
                msg.message_type, msg.message, msg.line
            ));
        }
    }

    if let Some(security) = report.security.completed() {
        for issue in security.issues.iter().filter(|i| i.is_significant()) {
            suggestions.push(format!(
                "Security issue ({}): {} (line {}, confidence: {})",
                issue.severity, issue.issue, issue.location.line, issue.confidence
            ));
        }
    }

    if report.style.completed().is_some_and(|s| s.needs_formatting) {
        suggestions.push("Code formatting: Consider using Black to format your code".to_string());
    }

    if let Some(structure) = report.structure.completed() {
        if structure.complexity.functions > MAX_FUNCTIONS {
            suggestions.push("Consider breaking down the code into smaller modules".to_string());
        }
        if structure.complexity.branches > MAX_BRANCHES {
            suggestions.push(
                "High cyclomatic complexity detected. Consider simplifying the logic".to_string(),
            );
        }
    }

    for (kind, failure) in report.failures() {
        suggestions.push(format!("The {} check did not run: {}", kind, failure));
    }

    suggestions
}

/// Render the report as plain text: quality, security, style, structure,
/// failures, suggestions
pub fn render_text(report: &AnalysisReport) -> String {
    let mut out: Vec<String> = vec![format!("Analysis of {}", report.file.display())];

    if let CheckOutcome::Completed(quality) = &report.quality {
        out.push(String::new());
        out.push("=== Pylint Analysis ===".to_string());
        if quality.messages.is_empty() {
            out.push("No issues found".to_string());
        }
        for msg in &quality.messages {
            out.push(format!(
                "[{}] Line {}: {} ({})",
                msg.message_type.to_string().to_uppercase(),
                msg.line,
                msg.message,
                msg.symbol
            ));
        }
    }

    if let CheckOutcome::Completed(security) = &report.security {
        out.push(String::new());
        out.push("=== Security Analysis (Bandit) ===".to_string());
        if security.issues.is_empty() {
            out.push("No issues found".to_string());
        }
        for issue in &security.issues {
            out.push(format!(
                "[{}] Line {}: {} (Confidence: {}, {})",
                issue.severity, issue.location.line, issue.issue, issue.confidence, issue.test_id
            ));
        }
    }

    if let CheckOutcome::Completed(style) = &report.style {
        out.push(String::new());
        out.push("=== Code Formatting (Black) ===".to_string());
        if style.needs_formatting {
            out.push("Code needs formatting. Consider using Black to format the code.".to_string());
            if let Some(diff) = &style.diff {
                out.push(diff.trim_end().to_string());
            }
        } else {
            out.push("Code is already formatted".to_string());
        }
    }

    if let CheckOutcome::Completed(structure) = &report.structure {
        out.push(String::new());
        out.push("=== Code Structure Analysis ===".to_string());
        out.push(format!("Functions: {}", structure.complexity.functions));
        out.push(format!("Classes: {}", structure.complexity.classes));
        out.push(format!("Branches: {}", structure.complexity.branches));
        out.push(format!("Loops: {}", structure.complexity.loops));

        if !structure.imports.is_empty() {
            out.push("\nImports:".to_string());
            out.extend(structure.imports.iter().map(|imp| format!("  - {}", imp)));
        }

        if !structure.functions.is_empty() {
            out.push("\nFunctions:".to_string());
            for func in &structure.functions {
                out.push(format!("  - {}({})", func.name, func.args.join(", ")));
            }
        }

        if !structure.classes.is_empty() {
            out.push("\nClasses:".to_string());
            for class in &structure.classes {
                out.push(format!("  - {}", class.name));
                out.extend(class.methods.iter().map(|m| format!("    * {}", m)));
            }
        }
    }

    let failures = report.failures();
    if !failures.is_empty() {
        out.push(String::new());
        out.push("=== Failed Checks ===".to_string());
        for (kind, failure) in failures {
            out.push(format!("[{}] {}", kind, failure));
        }
    }

    if !report.suggestions.is_empty() {
        out.push(String::new());
        out.push("=== Suggestions ===".to_string());
        out.extend(report.suggestions.iter().map(|s| format!("- {}", s)));
    }

    out.join("\n")
}

#[cfg(test)]
mod tests {
    use crate::analysis::structure::analyze_source;
    use crate::analysis::*;
    use std::path::PathBuf;

    fn quality_message(kind: MessageType, message: &str) -> QualityMessage {
        QualityMessage {
            message_type: kind,
            symbol: "some-symbol".to_string(),
            message_id: "X0001".to_string(),
            message: message.to_string(),
            line: 3,
            column: 0,
            obj: String::new(),
        }
    }

    fn security_issue(severity: IssueLevel) -> SecurityIssue {
        SecurityIssue {
            test_id: "B602".to_string(),
            test_name: "subprocess_popen_with_shell_equals_true".to_string(),
            issue: "shell=True".to_string(),
            severity,
            confidence: IssueLevel::High,
            location: SourceLocation { line: 7, column: 1 },
            more_info: None,
        }
    }

    fn sample_report() -> AnalysisReport {
        let branches = (0..6).map(|i| format!("if x == {}:\n    pass\n", i)).collect::<String>();
        AnalysisReport::new(
            PathBuf::from("app.py"),
            CheckOutcome::Completed(SecurityReport {
                issues: vec![security_issue(IssueLevel::Low), security_issue(IssueLevel::Medium)],
            }),
            CheckOutcome::Completed(QualityReport {
                messages: vec![
                    quality_message(MessageType::Convention, "Missing docstring"),
                    quality_message(MessageType::Error, "Undefined variable 'y'"),
                ],
            }),
            CheckOutcome::Failed(CheckError::ToolUnavailable {
                tool: "black".to_string(),
                install_hint: None,
            }),
            analyze_source(&branches).into(),
        )
    }

    #[test]
    fn test_suggestions() {
        let report = sample_report();
        assert_eq!(
            report.suggestions,
            vec![
                "Pylint error: Undefined variable 'y' (line 3)",
                "Security issue (MEDIUM): shell=True (line 7, confidence: HIGH)",
                "High cyclomatic complexity detected. Consider simplifying the logic",
                "The style check did not run: black is not installed",
            ]
        );
    }

    #[test]
    fn test_many_functions_suggest_splitting() {
        let code = (0..11).map(|i| format!("def f{}():\n    pass\n", i)).collect::<String>();
        let report = AnalysisReport::new(
            PathBuf::from("big.py"),
            CheckOutcome::Completed(SecurityReport::default()),
            CheckOutcome::Completed(QualityReport::default()),
            CheckOutcome::Completed(StyleReport { needs_formatting: true, diff: None }),
            analyze_source(&code).into(),
        );

        assert_eq!(
            report.suggestions,
            vec![
                "Code formatting: Consider using Black to format your code",
                "Consider breaking down the code into smaller modules",
            ]
        );
    }

    #[test]
    fn test_render_section_order() {
        let text = sample_report().render_text();

        let position = |needle: &str| {
            text.find(needle).unwrap_or_else(|| panic!("{needle:?} missing from:\n{text}"))
        };
        assert!(position("=== Pylint Analysis ===") < position("=== Security Analysis (Bandit) ==="));
        assert!(position("=== Security Analysis (Bandit) ===") < position("=== Code Structure Analysis ==="));
        assert!(position("=== Code Structure Analysis ===") < position("=== Failed Checks ==="));
        assert!(position("=== Failed Checks ===") < position("=== Suggestions ==="));

        assert!(text.contains("[ERROR] Line 3: Undefined variable 'y' (some-symbol)"));
        assert!(text.contains("[MEDIUM] Line 7: shell=True (Confidence: HIGH, B602)"));
        assert!(text.contains("Branches: 6"));
        assert!(text.contains("[style] black is not installed"));
        assert!(!text.contains("=== Code Formatting (Black) ==="));
    }
}
