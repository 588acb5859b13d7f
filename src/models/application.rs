// Loan application form
// Field names follow the API's camelCase wire format

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaritalStatus {
    Single,
    Married,
    Widow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationGuarantor {
    pub name: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub casp: Option<String>,
    pub phone: String,
}

/// Body of `POST /applications/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanApplicationData {
    pub applicant_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    pub date_of_birth: String,
    pub marital_status: MaritalStatus,
    pub business_name: String,
    pub business_address: String,
    #[serde(default)]
    pub business_sector: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_cycle: Option<String>,
    pub amount_applied: f64,
    pub purpose: String,
    pub project_cost: f64,
    pub own_contribution: f64,
    /// Months
    pub repayment_period: u32,
    pub monthly_repayments: f64,
    #[serde(default)]
    pub guarantors: Vec<ApplicationGuarantor>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_format() {
        let data = LoanApplicationData {
            applicant_name: "Chika Okafor".to_string(),
            group_name: None,
            date_of_birth: "1990-04-12".to_string(),
            marital_status: MaritalStatus::Widow,
            business_name: "Chika Stores".to_string(),
            business_address: "12 Market Rd".to_string(),
            business_sector: vec!["retail".to_string()],
            loan_cycle: Some("1".to_string()),
            amount_applied: 300000.0,
            purpose: "stock".to_string(),
            project_cost: 400000.0,
            own_contribution: 100000.0,
            repayment_period: 6,
            monthly_repayments: 50000.0,
            guarantors: vec![ApplicationGuarantor {
                name: "Emeka Obi".to_string(),
                address: "HQ".to_string(),
                description: None,
                casp: None,
                phone: "+2348011111111".to_string(),
            }],
        };

        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["applicantName"], "Chika Okafor");
        assert_eq!(value["maritalStatus"], "widow");
        assert_eq!(value["repaymentPeriod"], 6);
        assert!(value.get("groupName").is_none());
        assert!(value["guarantors"][0].get("casp").is_none());
    }

    #[test]
    fn test_parse_minimal_form() {
        let data: LoanApplicationData = serde_json::from_value(json!({
            "applicantName": "Ada",
            "dateOfBirth": "1988-01-01",
            "maritalStatus": "single",
            "businessName": "Ada Tailoring",
            "businessAddress": "3 Broad St",
            "amountApplied": 50000,
            "purpose": "machine",
            "projectCost": 60000,
            "ownContribution": 10000,
            "repaymentPeriod": 4,
            "monthlyRepayments": 12500
        }))
        .unwrap();

        assert_eq!(data.marital_status, MaritalStatus::Single);
        assert!(data.guarantors.is_empty());
        assert!(data.business_sector.is_empty());
    }
}
