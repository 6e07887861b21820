// Screening rubrics and the prompt/schema sent with every resume.

use std::str::FromStr;

use serde_json::{json, Value};

use crate::llm_client::prompts::EVIDENCE_ONLY_INSTRUCTION;

/// Which rubric resumes are screened against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreeningRole {
    Junior,
    Senior,
}

impl FromStr for ScreeningRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "junior" => Ok(ScreeningRole::Junior),
            "senior" => Ok(ScreeningRole::Senior),
            other => Err(format!("unknown screening role '{other}'")),
        }
    }
}

impl ScreeningRole {
    pub fn criteria(self) -> &'static str {
        match self {
            ScreeningRole::Junior => JUNIOR_SOFTWARE_ENGINEER,
            ScreeningRole::Senior => SENIOR_SOFTWARE_ENGINEER,
        }
    }
}

pub const SENIOR_SOFTWARE_ENGINEER: &str = "\
Concise Criteria: Senior Software Engineer
Role Summary: Designs, builds, and leads the development of complex, scalable software systems. \
Mentors others, drives technical decisions, and ensures high-quality delivery. Typically 5-8+ years of impactful experience.
Technical Depth & Breadth:
Mastery of relevant programming languages, frameworks, and libraries (e.g., Python/Django, Java/Spring, Go, Node/TS).
Strong grasp of data structures, algorithms, and their practical application.
Proficient with SQL/NoSQL databases, data modeling, and query optimization.
Expertise in Git and collaborative workflows.
System Design & Architecture:
Designs robust, scalable, and maintainable systems/features independently.
Applies design principles (SOLID) and architectural patterns (Microservices, Event-Driven, etc.) effectively.
Designs clear, well-documented APIs (REST, GraphQL, etc.).
Quality & Testing:
Champions comprehensive testing (unit, integration, E2E) and incorporates it into the development lifecycle.
Writes clean, maintainable, and well-documented code.
Infrastructure & Operations:
Experience with cloud platforms (AWS/Azure/GCP) and core services.
Proficient with containerization (Docker) and understands CI/CD principles/tools.
Understands monitoring/logging concepts.
Leadership & Collaboration:
Takes ownership and drives projects to completion with minimal supervision.
Mentors junior engineers and provides constructive code review feedback.
Communicates complex technical ideas clearly (verbal/written) to diverse audiences.
Collaborates effectively across teams.
Problem Solving:
Independently diagnoses and solves complex technical problems efficiently.
Demonstrates strong analytical and debugging skills.";

pub const JUNIOR_SOFTWARE_ENGINEER: &str = "\
Junior Software Intern
Role Summary: An enthusiastic learner contributing to software projects under guidance. \
Focuses on developing foundational skills, understanding team processes, and completing assigned tasks. \
Typically pursuing a relevant degree (CS, Engineering, etc.) or recently graduated.
Technical Foundations:
Basic understanding of core Computer Science concepts (Data Structures, Algorithms).
Some programming experience in at least one language (e.g., Python, Java, JavaScript) through coursework or personal projects.
Familiarity with basic programming concepts (variables, control flow, functions/methods).
Problem Solving:
Ability to approach simple problems logically and attempt solutions.
Can articulate their thought process, even if the solution isn't perfect.
Learning & Attitude:
High Priority: Demonstrates strong curiosity, enthusiasm, and a genuine eagerness to learn and receive feedback.
Proactive in asking questions when stuck.
Takes initiative to explore and understand concepts.
Positive and collaborative attitude.
Collaboration & Communication:
Willingness to work as part of a team.
Communicates basic ideas and questions clearly (verbal/written).
Uses version control (like Git) at a basic level or is willing to learn quickly.
Project Experience (Evidence):
Can discuss simple projects completed for school, personal learning, or contributions (if any).";

const SCREENING_PROMPT: &str = r#"You are an expert AI Hiring Manager assistant specializing in evaluating candidate resumes against specific job criteria.
Your task is to carefully analyze the attached candidate resume and determine if the candidate meets the qualifications outlined in the hiring criteria below.

HIRING CRITERIA:
{criteria}

INSTRUCTIONS:
1. Thoroughly read and understand all points in the Hiring Criteria.
2. Analyze the entire attached resume, looking for specific evidence (experiences, skills listed, project descriptions, roles held, technologies mentioned) that aligns with each criterion. Pay attention to keywords related to seniority (e.g. "led", "designed", "architected", "mentored", "optimized", years of experience).
3. Compare the evidence found in the resume against the requirements outlined in the criteria and assess whether the candidate's experience is sufficient for the level described.
4. {evidence_instruction}

Respond strictly in the required JSON format based on the provided schema."#;

pub fn screening_prompt(role: ScreeningRole) -> String {
    SCREENING_PROMPT
        .replace("{criteria}", role.criteria())
        .replace("{evidence_instruction}", EVIDENCE_ONLY_INSTRUCTION.trim())
}

/// Gemini response schema: an array of verdict objects.
pub fn verdict_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "qualified": {
                    "type": "BOOLEAN",
                    "description": "Whether the candidate is qualified or not",
                    "nullable": false
                },
                "name": {
                    "type": "STRING",
                    "description": "Name of the candidate",
                    "nullable": false
                },
                "currentRole": {
                    "type": "STRING",
                    "description": "Current role of the candidate eg. Software Architect or Fresher if no current role",
                    "nullable": false
                },
                "summary": {
                    "type": "STRING",
                    "description": "Summary of the candidate in around 30-40 words",
                    "nullable": false
                },
                "experience": {
                    "type": "ARRAY",
                    "items": {
                        "type": "STRING",
                        "description": "Role held followed by company name followed by duration. eg: Lead Developer @ TechCorp (2018-Present)",
                        "nullable": false
                    },
                    "nullable": false
                },
                "skills": {
                    "type": "STRING",
                    "description": "Skills of the candidate comma separated. eg: React, TypeScript, Node.js",
                    "nullable": false
                }
            },
            "required": ["qualified", "name", "currentRole", "summary", "experience", "skills"]
        }
    })
}
