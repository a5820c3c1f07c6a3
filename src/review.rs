use std::sync::LazyLock;

use regex::Regex;

use crate::models::{Difficulty, Review};

struct Patterns {
    contact: Regex,
    education: Regex,
    experience: Regex,
    skills: Regex,
    projects_section: Regex,
    project_mentions: Regex,
    technologies: Regex,
    tech_stack: Regex,
    repository: Regex,
    deployment: Regex,
    advanced: Regex,
    intermediate: Regex,
}

fn pattern(source: &str) -> Regex {
    Regex::new(&format!("(?i){source}")).expect("review patterns are valid regexes")
}

static PATTERNS: LazyLock<Patterns> = LazyLock::new(|| Patterns {
    contact: pattern("contact|email|phone|address"),
    education: pattern("education|degree|university|college"),
    experience: pattern("experience|work|employment|internship"),
    skills: pattern("skills|technical|programming|tools"),
    projects_section: pattern("projects|project"),
    project_mentions: pattern("project|app|website|system|application"),
    technologies: pattern(
        "react|node|python|java|javascript|sql|database|api|frontend|backend",
    ),
    tech_stack: pattern("tech stack|technologies|tools|framework"),
    repository: pattern("github|git|repository|repo"),
    deployment: pattern("deploy|host|live|url|link"),
    advanced: pattern(
        "machine learning|ml|ai|blockchain|microservices|docker|kubernetes|aws|cloud",
    ),
    intermediate: pattern("react|node|express|database|api|backend|frontend"),
});

const BASE_SCORE: f64 = 5.0;
const DETAILED_DESCRIPTION_CHARS: usize = 100;

/// Rounds to one decimal, then clamps to the 0..=10 scale. Increments are
/// summed without a cap so strong rows saturate at 10.
pub fn finalize_score(score: f64) -> f64 {
    ((score * 10.0).round() / 10.0).clamp(0.0, 10.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructureAnalysis {
    pub structure: String,
    pub score: f64,
}

pub fn analyze_resume_structure(resume_text: &str, resume_link: &str) -> StructureAnalysis {
    if resume_text.is_empty() && resume_link.is_empty() {
        return StructureAnalysis {
            structure: "No resume provided".to_string(),
            score: 0.0,
        };
    }

    let p = &*PATTERNS;
    let combined = format!("{} {}", resume_text.to_lowercase(), resume_link.to_lowercase());
    let sections: [(bool, &str, &str); 5] = [
        (
            p.contact.is_match(&combined),
            "Contact information present",
            "Missing contact information",
        ),
        (
            p.education.is_match(&combined),
            "Education section present",
            "Missing education section",
        ),
        (
            p.experience.is_match(&combined),
            "Experience section present",
            "Missing experience section",
        ),
        (
            p.skills.is_match(&combined),
            "Skills section present",
            "Missing skills section",
        ),
        (
            p.projects_section.is_match(&combined),
            "Projects section present",
            "Missing projects section",
        ),
    ];

    let mut score = BASE_SCORE;
    let mut strengths = Vec::new();
    let mut issues = Vec::new();

    for (found, strength, issue) in sections {
        if found {
            score += 1.0;
            strengths.push(strength);
        } else {
            issues.push(issue);
        }
    }

    if [".pdf", ".doc", "http"]
        .iter()
        .any(|marker| resume_link.contains(marker))
    {
        score += 0.5;
        strengths.push("Resume link provided");
    }

    let mut structure = String::new();
    if !strengths.is_empty() {
        structure.push_str(&format!("Strengths: {}. ", strengths.join(", ")));
    }
    if !issues.is_empty() {
        structure.push_str(&format!("Areas for improvement: {}.", issues.join(", ")));
    }

    StructureAnalysis {
        structure: structure.trim_end().to_string(),
        score: finalize_score(score),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectAnalysis {
    pub projects: String,
    pub score: f64,
    pub difficulty: Difficulty,
}

pub fn analyze_projects(projects_text: &str) -> ProjectAnalysis {
    if projects_text.trim().is_empty() {
        return ProjectAnalysis {
            projects: "No projects mentioned".to_string(),
            score: 0.0,
            difficulty: Difficulty::Easy,
        };
    }

    let p = &*PATTERNS;
    let text = projects_text.to_lowercase();
    let multiple_projects = p.project_mentions.find_iter(&text).count() > 1;
    let advanced = p.advanced.is_match(&text);

    let signals: [(bool, f64, &str); 6] = [
        (multiple_projects, 1.5, "Multiple projects mentioned"),
        (p.technologies.is_match(&text), 1.5, "Technologies specified"),
        (
            text.chars().count() > DETAILED_DESCRIPTION_CHARS,
            1.0,
            "Detailed project descriptions",
        ),
        (p.tech_stack.is_match(&text), 0.5, "Tech stack clearly listed"),
        (
            p.repository.is_match(&text),
            0.5,
            "GitHub/repository links provided",
        ),
        (p.deployment.is_match(&text), 0.5, "Deployed projects mentioned"),
    ];

    let mut score = BASE_SCORE;
    let mut observations = Vec::new();
    for (present, increment, observation) in signals {
        if present {
            score += increment;
            observations.push(observation);
        }
    }

    let difficulty = if advanced && multiple_projects {
        score += 1.0;
        Difficulty::Hard
    } else if p.intermediate.is_match(&text) || multiple_projects {
        Difficulty::Medium
    } else {
        Difficulty::Easy
    };

    let mut review = String::new();
    if !observations.is_empty() {
        review.push_str(&format!("Project highlights: {}. ", observations.join(", ")));
    }
    review.push_str(match difficulty {
        Difficulty::Hard => "Projects demonstrate advanced complexity and technical depth.",
        Difficulty::Medium => {
            "Projects show good technical understanding and practical application."
        }
        Difficulty::Easy => "Projects provide basic technical exposure.",
    });

    ProjectAnalysis {
        projects: review,
        score: finalize_score(score),
        difficulty,
    }
}

pub fn perform_automated_review(
    resume_text: &str,
    resume_link: &str,
    projects_text: &str,
) -> Review {
    let structure = analyze_resume_structure(resume_text, resume_link);
    let projects = analyze_projects(projects_text);

    Review {
        structure: structure.structure,
        projects: projects.projects,
        structure_score: structure.score,
        projects_score: projects.score,
        difficulty: projects.difficulty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_decimal(value: f64) -> bool {
        ((value * 10.0).round() - value * 10.0).abs() < 1e-9
    }

    #[test]
    fn missing_resume_scores_zero() {
        let analysis = analyze_resume_structure("", "");
        assert_eq!(analysis.score, 0.0);
        assert_eq!(analysis.structure, "No resume provided");
    }

    #[test]
    fn link_only_resume_gets_base_and_link_bonus() {
        let analysis = analyze_resume_structure("", "https://drive.example.com/cv.pdf");
        assert_eq!(analysis.score, 5.5);
        assert!(analysis.structure.starts_with("Strengths: Resume link provided."));
        assert!(analysis.structure.contains("Missing education section"));
    }

    #[test]
    fn full_resume_saturates_at_ten() {
        let text = "Contact: asha@example.com. Education: B.Tech. Experience: internship. \
                    Skills: Rust. Projects: roster tool.";
        let analysis = analyze_resume_structure(text, "https://example.com/cv.pdf");
        assert_eq!(analysis.score, 10.0);
        assert!(!analysis.structure.contains("Areas for improvement"));
    }

    #[test]
    fn empty_projects_are_easy_and_zero() {
        let analysis = analyze_projects("   ");
        assert_eq!(analysis.score, 0.0);
        assert_eq!(analysis.difficulty, Difficulty::Easy);
        assert_eq!(analysis.projects, "No projects mentioned");
    }

    #[test]
    fn docker_with_two_projects_is_hard() {
        let analysis = analyze_projects("Project one uses docker. Project two is a CLI.");
        assert_eq!(analysis.difficulty, Difficulty::Hard);
        // base 5 + multiple 1.5 + advanced-and-multiple 1
        assert_eq!(analysis.score, 7.5);
        assert!(analysis.projects.contains("advanced complexity"));
    }

    #[test]
    fn intermediate_tech_alone_is_medium() {
        let analysis = analyze_projects("Built a react dashboard");
        assert_eq!(analysis.difficulty, Difficulty::Medium);
        assert_eq!(analysis.score, 6.5);
    }

    #[test]
    fn plain_single_mention_is_easy() {
        let analysis = analyze_projects("Calculator");
        assert_eq!(analysis.difficulty, Difficulty::Easy);
        assert_eq!(analysis.score, 5.0);
        assert_eq!(analysis.projects, "Projects provide basic technical exposure.");
    }

    #[test]
    fn every_signal_clamps_to_ten() {
        let text = "Project A: a website built with React and Node, tech stack listed, \
                    code on GitHub and deployed live on AWS. Project B: a machine learning \
                    system with docker and kubernetes, hosted on the cloud.";
        let analysis = analyze_projects(text);
        assert_eq!(analysis.score, 10.0);
        assert_eq!(analysis.difficulty, Difficulty::Hard);
    }

    #[test]
    fn scores_stay_in_range_with_one_decimal() {
        let inputs = [
            ("", "", ""),
            ("skills", "", "app"),
            ("education and work", "cv.doc", "project project project"),
            ("x", "y", "a website and an application with sql and a repo link"),
        ];
        for (resume, link, projects) in inputs {
            let review = perform_automated_review(resume, link, projects);
            for score in [review.structure_score, review.projects_score] {
                assert!((0.0..=10.0).contains(&score), "score {score} out of range");
                assert!(one_decimal(score), "score {score} not rounded");
            }
        }
    }

    #[test]
    fn review_is_deterministic() {
        let a = perform_automated_review("skills", "http://cv", "two apps: app one");
        let b = perform_automated_review("skills", "http://cv", "two apps: app one");
        assert_eq!(a, b);
    }
}
