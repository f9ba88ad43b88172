//! Static catalogues shown by the wizard

use crate::state::DocumentDescriptor;

/// One selectable option of a choice field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChoiceDef {
    pub value: &'static str,
    pub label: &'static str,
}

const fn choice(value: &'static str, label: &'static str) -> ChoiceDef {
    ChoiceDef { value, label }
}

/// Card shown on the loan selection screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogueItem {
    pub id: u32,
    pub label: &'static str,
    pub value: &'static str,
    pub icon: &'static str,
}

pub const LOANS: &[CatalogueItem] = &[
    CatalogueItem { id: 1, label: "Home Loan", value: "home", icon: "🏠" },
    CatalogueItem { id: 2, label: "Personal Loan", value: "personal", icon: "💳" },
    CatalogueItem { id: 3, label: "Vehicle Loan", value: "vehicle", icon: "🚗" },
    CatalogueItem { id: 4, label: "Education Loan", value: "education", icon: "🎓" },
];

pub const LOAN_SUBTYPES: &[CatalogueItem] = &[
    CatalogueItem { id: 1, label: "4 Wheeler", value: "4wheeler", icon: "🚗" },
    CatalogueItem { id: 2, label: "2 Wheeler", value: "2wheeler", icon: "🏍️" },
];

pub const CONSUMER_CATEGORIES: &[ChoiceDef] = &[
    choice("individual", "Individual"),
    choice("non-individual", "Non Individual"),
    choice("nri", "NRI"),
];

pub const EMPLOYMENT_TYPES: &[ChoiceDef] = &[
    choice("salaried", "Salaried"),
    choice("professional", "Professional"),
    choice("business", "Business / self-employed"),
];

pub const KYC_DOCUMENTS: &[ChoiceDef] = &[
    choice("aadhar", "Aadhar Card"),
    choice("passport", "Passport"),
    choice("driving_license", "Driving License"),
    choice("voter_id", "Voter ID Card"),
    choice("pan_card", "PAN Card"),
];

pub const GENDERS: &[ChoiceDef] = &[
    choice("male", "Male"),
    choice("female", "Female"),
    choice("other", "Other"),
];

pub const HOUSE_OWNERSHIP: &[ChoiceDef] = &[
    choice("ownedByMe", "Owned by Me"),
    choice("familyOwned", "Family Owned"),
    choice("notOwned", "Not Owned by me"),
];

/// Addresses on record, keyed by the document they were read from
pub const PRESENT_ADDRESSES: &[ChoiceDef] = &[
    choice(
        "1405 Glendale CHSL Off M G Road Hariniwas Circle Near Majiwada Thane 400604",
        "Source: Aadhar Card",
    ),
    choice(
        "306 GlenEagle Towers Off M G Road Hariniwas Circle Near Majiwada Thane 400604",
        "Source: Pan Card",
    ),
    choice(
        "1800 CrossRoad Heights Off M G Road Hariniwas Circle Near Majiwada Thane 400604",
        "Source: Passport",
    ),
];

pub const YEAR_OPTIONS: &[&str] = &["2022", "2023", "2024", "2025"];

pub const MONTH_YEAR_OPTIONS: &[&str] = &[
    "JAN 24", "FEB 24", "MAR 24", "APR 24", "MAY 24", "JUN 24", "JUL 24", "AUG 24", "SEP 24",
    "OCT 24", "NOV 24", "DEC 24",
];

/// Checklist used when the config file does not supply one
pub fn default_checklist() -> Vec<DocumentDescriptor> {
    const BANK: &str = "Bank Statement";
    const ITR: &str = "Upload/Fetch Form 16 OR Upload ITR";
    const SALARY: &str = "Upload Salary Slip";
    const PHOTO: &str = "Photograph";

    vec![
        DocumentDescriptor::new("bankStatement", "Bank Statement", BANK)
            .with_note("You can upload multiple bank statements."),
        DocumentDescriptor::new("itr2024", "Form 16 / ITR", ITR).with_year("2024"),
        DocumentDescriptor::new("itr2023", "Form 16 / ITR", ITR).with_year("2023"),
        DocumentDescriptor::new("itr2022", "Form 16 / ITR", ITR).with_year("2022"),
        DocumentDescriptor::new("salaryJan24", "Salary Slip", SALARY).with_month_year("JAN 24"),
        DocumentDescriptor::new("salaryFeb24", "Salary Slip", SALARY).with_month_year("FEB 24"),
        DocumentDescriptor::new("salaryMar24", "Salary Slip", SALARY).with_month_year("MAR 24"),
        DocumentDescriptor::new("latestPhoto", "Latest Photo", PHOTO),
    ]
}

/// Look up a catalogue entry by its value
pub fn catalogue_item(items: &'static [CatalogueItem], value: &str) -> Option<&'static CatalogueItem> {
    items.iter().find(|item| item.value == value)
}
