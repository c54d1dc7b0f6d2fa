//! Shared data models for the JobDesk backend.
//!
//! This crate provides Serde-serializable types for:
//! - User accounts, roles, and presence status
//! - Companies and their HR ownership
//! - Job postings with location/time/seniority enums
//! - Job applications

pub mod application;
pub mod company;
pub mod job;
pub mod user;

// Re-export common types
pub use application::{Application, ApplicationId, ApplicationWithApplicant, ApplicantInfo};
pub use company::{Company, CompanyId};
pub use job::{Job, JobId, JobLocation, JobWithCompany, SeniorityLevel, WorkingTime};
pub use user::{User, UserId, UserProfile, UserRole, UserStatus};
