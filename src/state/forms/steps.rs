//! Loan types and the ordered steps each one walks through

use super::validation::FieldCategory;
use crate::data::{
    catalogue_item, ChoiceDef, CatalogueItem, CONSUMER_CATEGORIES, EMPLOYMENT_TYPES, GENDERS,
    HOUSE_OWNERSHIP, KYC_DOCUMENTS, LOANS, LOAN_SUBTYPES, PRESENT_ADDRESSES,
};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const FULL_NAME: &str = "fullName";
pub const MOBILE_NUMBER: &str = "mobileNumber";
pub const EMAIL: &str = "email";
pub const KYC_DOCUMENT: &str = "kycDocument";
pub const KYC_NUMBER: &str = "kycNumber";
pub const ADDRESS_DIFFERS: &str = "sameAsPermanent";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanType {
    Home,
    Personal,
    Vehicle,
    Education,
}

impl LoanType {
    pub const ALL: [LoanType; 4] = [Self::Home, Self::Personal, Self::Vehicle, Self::Education];

    pub fn value(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Personal => "personal",
            Self::Vehicle => "vehicle",
            Self::Education => "education",
        }
    }

    pub fn from_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.value() == value)
    }

    pub fn catalogue(&self) -> Option<&'static CatalogueItem> {
        catalogue_item(LOANS, self.value())
    }

    pub fn label(&self) -> &'static str {
        self.catalogue().map(|c| c.label).unwrap_or("Loan")
    }

    pub fn has_subtypes(&self) -> bool {
        matches!(self, Self::Vehicle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleSubtype {
    #[serde(rename = "4wheeler")]
    FourWheeler,
    #[serde(rename = "2wheeler")]
    TwoWheeler,
}

impl VehicleSubtype {
    pub const ALL: [VehicleSubtype; 2] = [Self::FourWheeler, Self::TwoWheeler];

    pub fn value(&self) -> &'static str {
        match self {
            Self::FourWheeler => "4wheeler",
            Self::TwoWheeler => "2wheeler",
        }
    }

    pub fn from_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.value() == value)
    }

    pub fn label(&self) -> &'static str {
        catalogue_item(LOAN_SUBTYPES, self.value())
            .map(|c| c.label)
            .unwrap_or("Vehicle")
    }
}

/// Loan type and subtype picked before entering the wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanSelection {
    pub loan_type: LoanType,
    pub subtype: Option<VehicleSubtype>,
}

impl LoanSelection {
    pub fn new(loan_type: LoanType, subtype: Option<VehicleSubtype>) -> Self {
        // Subtypes only mean something for vehicle loans
        let subtype = if loan_type.has_subtypes() {
            subtype.or(Some(VehicleSubtype::FourWheeler))
        } else {
            None
        };
        Self { loan_type, subtype }
    }

    /// Parse the `<loanType>/<subtype>` pair used on the command line
    pub fn from_values(loan_type: &str, subtype: Option<&str>) -> Option<Self> {
        let loan_type = LoanType::from_value(loan_type)?;
        let subtype = match subtype {
            Some(s) => Some(VehicleSubtype::from_value(s)?),
            None => None,
        };
        Some(Self::new(loan_type, subtype))
    }
}

impl fmt::Display for LoanSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.subtype {
            Some(subtype) => write!(f, "{} ({})", self.loan_type.label(), subtype.label()),
            None => write!(f, "{}", self.loan_type.label()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    LoanProfile,
    AboutYou,
    MoreAboutYou,
    DealerInvoice,
}

impl StepId {
    pub fn title(&self) -> &'static str {
        match self {
            Self::LoanProfile => "Loan Profile",
            Self::AboutYou => "About You",
            Self::MoreAboutYou => "More About You",
            Self::DealerInvoice => "Dealer Invoice",
        }
    }
}

/// Input widget backing a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text { multiline: bool },
    Choice(&'static [ChoiceDef]),
    Flag,
}

/// How a field's validation category is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Only the required check applies
    Presence,
    Fixed(FieldCategory),
    /// Follows the selected KYC document type
    KycDocumentNumber,
}

/// Where a field's OTP is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpChannel {
    /// The email address being verified
    Email,
    /// The mobile number held in the session
    RegisteredMobile,
}

/// Static description of one field in a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub rule: FieldRule,
    /// Message shown when the field is left empty; `None` means optional
    pub required: Option<&'static str>,
    pub otp: Option<OtpChannel>,
    /// Flag field that must be set for this field to be shown
    pub visible_when: Option<&'static str>,
    /// Fields re-validated once this one is verified
    pub revalidate_on_verify: &'static [&'static str],
}

impl FieldSpec {
    const fn base(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            rule: FieldRule::Presence,
            required: None,
            otp: None,
            visible_when: None,
            revalidate_on_verify: &[],
        }
    }

    const fn text(name: &'static str, label: &'static str, category: FieldCategory) -> Self {
        let mut spec = Self::base(name, label, FieldKind::Text { multiline: false });
        spec.rule = FieldRule::Fixed(category);
        spec
    }

    const fn choice(name: &'static str, label: &'static str, options: &'static [ChoiceDef]) -> Self {
        Self::base(name, label, FieldKind::Choice(options))
    }

    const fn required(mut self, message: &'static str) -> Self {
        self.required = Some(message);
        self
    }

    const fn multiline(mut self) -> Self {
        self.kind = FieldKind::Text { multiline: true };
        self
    }

    const fn otp(mut self, channel: OtpChannel) -> Self {
        self.otp = Some(channel);
        self
    }

    const fn visible_when(mut self, flag: &'static str) -> Self {
        self.visible_when = Some(flag);
        self
    }

    const fn revalidates(mut self, fields: &'static [&'static str]) -> Self {
        self.revalidate_on_verify = fields;
        self
    }
}

/// Ordered step of the wizard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDefinition {
    pub id: StepId,
    pub fields: Vec<FieldSpec>,
}

impl StepDefinition {
    pub fn title(&self) -> &'static str {
        self.id.title()
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }
}

const CONSUMER_CATEGORY: FieldSpec = FieldSpec::choice("consumerCategory", "Consumer Category", CONSUMER_CATEGORIES)
    .required("Please select a consumer category");
const EMPLOYMENT_TYPE: FieldSpec = FieldSpec::choice("employmentType", "Employment Type", EMPLOYMENT_TYPES)
    .required("Please select an employment type");
const MOBILE: FieldSpec = FieldSpec::text(MOBILE_NUMBER, "Mobile Number", FieldCategory::Mobile)
    .required("Mobile Number is required");

const ABOUT_YOU: &[FieldSpec] = &[
    FieldSpec::text(FULL_NAME, "Full Name", FieldCategory::Alphabet).required("Full Name is required"),
    FieldSpec::text("panNumber", "PAN", FieldCategory::Pan).required("PAN is required"),
    FieldSpec::text("dob", "Date of Birth (YYYY-MM-DD)", FieldCategory::Dob)
        .required("Date of Birth is required"),
    FieldSpec::text(EMAIL, "Email", FieldCategory::Email)
        .required("Email is required")
        .otp(OtpChannel::Email)
        .revalidates(&[KYC_NUMBER]),
    FieldSpec::choice(KYC_DOCUMENT, "KYC Document", KYC_DOCUMENTS).required("KYC Document is required"),
    FieldSpec {
        rule: FieldRule::KycDocumentNumber,
        ..FieldSpec::base(KYC_NUMBER, "KYC Number", FieldKind::Text { multiline: false })
    }
    .required("KYC Number is required")
    .otp(OtpChannel::RegisteredMobile)
    .revalidates(&[KYC_NUMBER]),
];

const MORE_ABOUT_YOU: &[FieldSpec] = &[
    FieldSpec::choice("gender", "Gender", GENDERS).required("Gender is required"),
    FieldSpec::choice("presentAddress", "Present Address", PRESENT_ADDRESSES)
        .required("Please select a present address"),
    FieldSpec::base(
        ADDRESS_DIFFERS,
        "My present address is different from my permanent address",
        FieldKind::Flag,
    ),
    FieldSpec::text("address1", "Address Line 1", FieldCategory::TextArea)
        .multiline()
        .required("Address 1 is required")
        .visible_when(ADDRESS_DIFFERS),
    FieldSpec::text("address2", "Address Line 2 (Optional)", FieldCategory::TextArea)
        .multiline()
        .visible_when(ADDRESS_DIFFERS),
    FieldSpec::text("city", "City", FieldCategory::Alphabet)
        .required("City is required")
        .visible_when(ADDRESS_DIFFERS),
    FieldSpec::text("state", "State", FieldCategory::Alphabet)
        .required("State is required")
        .visible_when(ADDRESS_DIFFERS),
    FieldSpec::text("pincode", "Pincode", FieldCategory::Pincode)
        .required("Pincode is required")
        .visible_when(ADDRESS_DIFFERS),
    FieldSpec::choice("houseOwnership", "House Ownership", HOUSE_OWNERSHIP)
        .required("Please select house ownership"),
];

const DEALER_INVOICE: &[FieldSpec] = &[
    FieldSpec::text("dealerName", "Dealer Name", FieldCategory::Alphabet)
        .required("Dealer Name is required"),
    FieldSpec::text("invoiceNumber", "Invoice Number", FieldCategory::TextField)
        .required("Invoice Number is required"),
    FieldSpec::text("invoiceAmount", "Invoice Amount (INR)", FieldCategory::Amount)
        .required("Invoice Amount is required"),
];

/// Steps for a loan selection, in traversal order
pub fn steps_for(selection: &LoanSelection) -> Vec<StepDefinition> {
    let mut profile = vec![CONSUMER_CATEGORY];
    if selection.loan_type != LoanType::Education {
        profile.push(EMPLOYMENT_TYPE);
    }
    profile.push(MOBILE);

    let mut steps = vec![
        StepDefinition {
            id: StepId::LoanProfile,
            fields: profile,
        },
        StepDefinition {
            id: StepId::AboutYou,
            fields: ABOUT_YOU.to_vec(),
        },
        StepDefinition {
            id: StepId::MoreAboutYou,
            fields: MORE_ABOUT_YOU.to_vec(),
        },
    ];
    if selection.loan_type == LoanType::Vehicle {
        steps.push(StepDefinition {
            id: StepId::DealerInvoice,
            fields: DEALER_INVOICE.to_vec(),
        });
    }
    steps
}

/// Validation category for a KYC document type
pub fn kyc_category(document: &str) -> FieldCategory {
    match document {
        "passport" => FieldCategory::Passport,
        "driving_license" => FieldCategory::DrivingLicence,
        "voter_id" => FieldCategory::VoterId,
        "pan_card" => FieldCategory::Pan,
        _ => FieldCategory::Aadhar,
    }
}

/// "Aadhar Number is required" style message for the KYC number
pub fn kyc_required_message(document: Option<&str>) -> String {
    let label = match document {
        Some("passport") => "Passport",
        Some("driving_license") => "Driving License",
        Some("voter_id") => "Voter ID",
        Some("pan_card") => "PAN",
        Some(_) => "Aadhar",
        None => "KYC",
    };
    format!("{label} Number is required")
}
