// Applicant directory models
// Field names follow the API's snake_case wire format

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub last_name: String,
    #[serde(default)]
    pub middle_name: String,
    pub first_name: String,
    pub phone_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessInfo {
    pub enterprise_type: String,
    pub business_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressInfo {
    pub business_address: String,
    pub home_address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanInfo {
    pub loan_amount: f64,
    pub loan_purpose: String,
    /// Months
    pub loan_duration: u32,
    pub monthly_repayment: f64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guarantor {
    pub full_name: String,
    pub staff_id: String,
    pub phone_number: String,
    pub office_address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacialPhoto {
    /// Base64 image data
    pub photo_data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdditionalInfo {
    pub comments: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BioData {
    pub personal_info: PersonalInfo,
    pub business_info: BusinessInfo,
    pub address_info: AddressInfo,
    pub loan_info: LoanInfo,
    #[serde(default)]
    pub guarantors: Vec<Guarantor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facial_photo: Option<FacialPhoto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<AdditionalInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationState {
    Pending,
    Approved,
    Rejected,
    UnderReview,
    NotSubmitted,
}

impl ApplicationState {
    /// Wire name, as used in query filters
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationState::Pending => "pending",
            ApplicationState::Approved => "approved",
            ApplicationState::Rejected => "rejected",
            ApplicationState::UnderReview => "under_review",
            ApplicationState::NotSubmitted => "not_submitted",
        }
    }
}

impl std::str::FromStr for ApplicationState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "pending" => Ok(ApplicationState::Pending),
            "approved" => Ok(ApplicationState::Approved),
            "rejected" => Ok(ApplicationState::Rejected),
            "under_review" => Ok(ApplicationState::UnderReview),
            "not_submitted" => Ok(ApplicationState::NotSubmitted),
            other => Err(format!("unknown application status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationStatus {
    pub status: ApplicationState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_officer: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepaymentStatus {
    Paid,
    Pending,
    Overdue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepaymentScheduleItem {
    pub due_date: String,
    pub amount: f64,
    pub status: RepaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<String>,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub registration_date: String,
}

/// Applicant profile as returned by the directory endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: u64,
    pub personal_info: PersonalInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio_data: Option<BioData>,
    pub application_status: ApplicationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empowerment_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repayment_schedule: Option<Vec<RepaymentScheduleItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_info: Option<AccountInfo>,
}

/// Directory query filters; unset fields are left out of the query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilters {
    pub status: Option<ApplicationState>,
    pub search: Option<String>,
}

/// Figures shown on a profile's detail view
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSummary {
    pub full_name: String,
    pub loan_amount: f64,
    pub paid_amount: f64,
    /// Whole percent of the loan repaid
    pub progress: u32,
    pub overdue_installments: usize,
}

impl ProfileSummary {
    pub fn from_profile(profile: &UserProfile) -> Self {
        let info = &profile.personal_info;
        let full_name = [
            info.last_name.as_str(),
            info.first_name.as_str(),
            info.middle_name.as_str(),
        ]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ");

        let loan_amount = profile
            .bio_data
            .as_ref()
            .map(|bio| bio.loan_info.loan_amount)
            .unwrap_or(0.0);

        let schedule = profile.repayment_schedule.as_deref().unwrap_or_default();
        let paid_amount = schedule
            .iter()
            .filter(|item| item.status == RepaymentStatus::Paid)
            .map(|item| item.amount)
            .sum::<f64>();
        let overdue_installments = schedule
            .iter()
            .filter(|item| item.status == RepaymentStatus::Overdue)
            .count();

        let progress = if loan_amount > 0.0 {
            ((paid_amount / loan_amount) * 100.0).round().max(0.0) as u32
        } else {
            0
        };

        Self {
            full_name,
            loan_amount,
            paid_amount,
            progress,
            overdue_installments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile_json() -> serde_json::Value {
        json!({
            "id": 12,
            "personal_info": {
                "last_name": "Okafor",
                "middle_name": "",
                "first_name": "Chika",
                "phone_number": "+2348000000000"
            },
            "bio_data": {
                "personal_info": {
                    "last_name": "Okafor",
                    "middle_name": "",
                    "first_name": "Chika",
                    "phone_number": "+2348000000000"
                },
                "business_info": {"enterprise_type": "retail", "business_name": "Chika Stores"},
                "address_info": {"business_address": "12 Market Rd", "home_address": "4 Palm Ave"},
                "loan_info": {
                    "loan_amount": 300000,
                    "loan_purpose": "stock",
                    "loan_duration": 6,
                    "monthly_repayment": 50000,
                    "currency": "NGN"
                },
                "guarantors": [{
                    "full_name": "Emeka Obi",
                    "staff_id": "ST-001",
                    "phone_number": "+2348011111111",
                    "office_address": "HQ"
                }]
            },
            "application_status": {"status": "under_review", "assigned_officer": "Bola"},
            "repayment_schedule": [
                {"due_date": "2025-01-31", "amount": 50000, "status": "paid", "payment_date": "2025-01-30", "balance": 250000},
                {"due_date": "2025-02-28", "amount": 50000, "status": "paid", "balance": 200000},
                {"due_date": "2025-03-31", "amount": 50000, "status": "overdue", "balance": 200000},
                {"due_date": "2025-04-30", "amount": 50000, "status": "pending", "balance": 200000}
            ],
            "account_info": {"registration_date": "2024-11-02"}
        })
    }

    #[test]
    fn test_profile_parsing() {
        let profile: UserProfile = serde_json::from_value(profile_json()).unwrap();
        assert_eq!(profile.id, 12);
        assert_eq!(
            profile.application_status.status,
            ApplicationState::UnderReview
        );
        assert_eq!(profile.repayment_schedule.as_ref().unwrap().len(), 4);
        assert!(profile.empowerment_date.is_none());
    }

    #[test]
    fn test_profile_summary() {
        let profile: UserProfile = serde_json::from_value(profile_json()).unwrap();
        let summary = ProfileSummary::from_profile(&profile);

        assert_eq!(summary.full_name, "Okafor Chika");
        assert_eq!(summary.loan_amount, 300000.0);
        assert_eq!(summary.paid_amount, 100000.0);
        assert_eq!(summary.progress, 33);
        assert_eq!(summary.overdue_installments, 1);
    }

    #[test]
    fn test_profile_summary_without_loan() {
        let mut value = profile_json();
        value.as_object_mut().unwrap().remove("bio_data");
        value.as_object_mut().unwrap().remove("repayment_schedule");
        let profile: UserProfile = serde_json::from_value(value).unwrap();

        let summary = ProfileSummary::from_profile(&profile);
        assert_eq!(summary.loan_amount, 0.0);
        assert_eq!(summary.paid_amount, 0.0);
        assert_eq!(summary.progress, 0);
    }

    #[test]
    fn test_application_state_parsing() {
        assert_eq!(
            "under review".parse::<ApplicationState>(),
            Ok(ApplicationState::UnderReview)
        );
        assert_eq!(
            "APPROVED".parse::<ApplicationState>(),
            Ok(ApplicationState::Approved)
        );
        assert!("archived".parse::<ApplicationState>().is_err());
        assert_eq!(ApplicationState::NotSubmitted.as_str(), "not_submitted");
    }
}
