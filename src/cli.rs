// Subcommand handlers

use anyhow::{Context, Result};
use dialoguer::{Input, Password};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

use loan_agency_client::auth::{AuthService, Session, SignInData, SignUpData};
use loan_agency_client::config::{ApplicationsCommand, Command, UsersCommand};
use loan_agency_client::display::{format_currency, format_date, format_status};
use loan_agency_client::models::{LoanApplicationData, ProfileSummary, UserFilters, UserProfile};
use loan_agency_client::services::{ApplicationsService, UsersService};
use loan_agency_client::{ApiClient, FileUpload};

pub async fn run(command: Command, api: Arc<ApiClient>) -> Result<()> {
    match command {
        Command::SignIn { email } => sign_in(api, email).await,
        Command::SignUp => sign_up(api).await,
        Command::SignOut => {
            AuthService::new(api).sign_out()?;
            println!("Signed out.");
            Ok(())
        }
        Command::Whoami => {
            let mut session = Session::new(api);
            match session.restore().await {
                Some(user) => println!(
                    "{} {} <{}> (id {})",
                    user.first_name, user.last_name, user.email, user.id
                ),
                None => println!("Not signed in."),
            }
            Ok(())
        }
        Command::VerifyPhone { phone } => {
            AuthService::new(api).verify_phone(&phone).await?;
            println!("Verification code sent to {}.", phone);
            Ok(())
        }
        Command::VerifyCode { phone, code } => {
            AuthService::new(api).verify_code(&phone, &code).await?;
            println!("Phone number {} verified.", phone);
            Ok(())
        }
        Command::Users(cmd) => users(api, cmd).await,
        Command::Applications(cmd) => applications(api, cmd).await,
        Command::Upload { path, file } => {
            let upload = FileUpload::from_path(&file)?;
            let response: Value = api.upload_file(&path, upload, None).await?;
            print_json(&response)
        }
    }
}

async fn sign_in(api: Arc<ApiClient>, email: Option<String>) -> Result<()> {
    let email = match email {
        Some(email) => email,
        None => Input::new()
            .with_prompt("Email")
            .interact_text()
            .context("Failed to read email")?,
    };
    let password = Password::new()
        .with_prompt("Password")
        .interact()
        .context("Failed to read password")?;

    let mut session = Session::new(api);
    let user = session.sign_in(&SignInData { email, password }).await?;
    println!("Signed in as {} {}.", user.first_name, user.last_name);
    Ok(())
}

async fn sign_up(api: Arc<ApiClient>) -> Result<()> {
    let data = SignUpData {
        last_name: prompt("Last name")?,
        middle_name: Input::new()
            .with_prompt("Middle name")
            .allow_empty(true)
            .interact_text()
            .context("Failed to read middle name")?,
        first_name: prompt("First name")?,
        country: prompt("Country")?,
        phone_number: prompt("Phone number")?,
        password: Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords do not match")
            .interact()
            .context("Failed to read password")?,
    };

    let mut session = Session::new(api);
    let user = session.sign_up(&data).await?;
    println!("Welcome, {}! Your account has been created.", user.first_name);
    Ok(())
}

async fn users(api: Arc<ApiClient>, command: UsersCommand) -> Result<()> {
    let service = UsersService::new(api);

    match command {
        UsersCommand::List { status, search } => {
            let profiles = service.list(&UserFilters { status, search }).await?;
            if profiles.is_empty() {
                println!("No applicants found.");
            }
            for profile in &profiles {
                let summary = ProfileSummary::from_profile(profile);
                println!(
                    "{:>6}  {:<32}  {}",
                    profile.id,
                    summary.full_name,
                    format_status(profile.application_status.status.as_str())
                );
            }
            Ok(())
        }
        UsersCommand::Show { id } => {
            let profile = service.get(id).await?;
            print_profile(&profile);
            Ok(())
        }
        UsersCommand::Update { id, json } => {
            let patch: Value = read_json(&json)?;
            let profile = service.update(id, &patch).await?;
            print_profile(&profile);
            Ok(())
        }
    }
}

async fn applications(api: Arc<ApiClient>, command: ApplicationsCommand) -> Result<()> {
    let service = ApplicationsService::new(api);

    match command {
        ApplicationsCommand::Submit { file } => {
            let data: LoanApplicationData = read_json(&file)?;
            let response = service.submit(&data).await?;
            println!("Application submitted.");
            print_json(&response)
        }
        ApplicationsCommand::Show { id } => print_json(&service.get(id).await?),
        ApplicationsCommand::Mine => {
            let list = service.mine().await?;
            print_json(&Value::Array(list))
        }
    }
}

fn print_profile(profile: &UserProfile) {
    let summary = ProfileSummary::from_profile(profile);
    let status = &profile.application_status;

    println!("{}", summary.full_name);
    println!("  Phone:          {}", profile.personal_info.phone_number);
    println!("  Status:         {}", format_status(status.status.as_str()));
    if let Some(ref officer) = status.assigned_officer {
        println!("  Officer:        {}", officer);
    }
    println!(
        "  Member since:   {}",
        format_date(
            profile
                .account_info
                .as_ref()
                .map(|a| a.registration_date.as_str())
        )
    );
    println!(
        "  Empowered:      {}",
        format_date(profile.empowerment_date.as_deref())
    );

    if let Some(ref bio) = profile.bio_data {
        println!("  Business:       {}", bio.business_info.business_name);
        println!("  Loan purpose:   {}", bio.loan_info.loan_purpose);
        println!(
            "  Monthly:        {}",
            format_currency(bio.loan_info.monthly_repayment)
        );
    }

    println!();
    println!(
        "  Total loan {}  |  Paid {}  |  Progress {}%",
        format_currency(summary.loan_amount),
        format_currency(summary.paid_amount),
        summary.progress
    );

    if let Some(ref schedule) = profile.repayment_schedule {
        println!();
        println!("  Repayment schedule");
        for item in schedule {
            println!(
                "    {:<14} {:>14}  {:<8} balance {}",
                format_date(Some(item.due_date.as_str())),
                format_currency(item.amount),
                format!("{:?}", item.status).to_uppercase(),
                format_currency(item.balance)
            );
        }
        if summary.overdue_installments > 0 {
            println!(
                "  {} installment(s) overdue",
                summary.overdue_installments
            );
        }
    }
}

fn prompt(label: &str) -> Result<String> {
    Input::new()
        .with_prompt(label)
        .interact_text()
        .with_context(|| format!("Failed to read {}", label.to_lowercase()))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
