//! Per-track form definitions: fields, eligibility boxes and attachment slots.

use crate::models::Track;

/// Literal value of the empty option in select fields. Treated as "not chosen".
pub const SELECT_PLACEHOLDER: &str = "— Select —";

pub const ABSTRACT_WORD_LIMIT: usize = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Email,
    TextArea,
    Select(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct CheckboxDef {
    /// Form input name.
    pub name: &'static str,
    /// Key under `payload.eligibility`.
    pub key: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct AttachmentSlot {
    /// Form input name.
    pub field: &'static str,
    /// Key in the uploads mapping.
    pub role: &'static str,
    /// Storage key prefix.
    pub prefix: &'static str,
    pub label: &'static str,
    pub accept: &'static str,
}

/// Which payload fields carry the applicant identity.
#[derive(Debug, Clone, Copy)]
pub struct IdentityFields {
    pub name: &'static str,
    pub email: &'static str,
    pub phone: Option<&'static str>,
}

#[derive(Debug)]
pub struct TrackForm {
    pub track: Track,
    pub heading: &'static str,
    pub fields: &'static [FieldDef],
    pub eligibility: &'static [CheckboxDef],
    pub attachments: &'static [AttachmentSlot],
    pub identity: IdentityFields,
    pub default_content_type: &'static str,
    pub word_limited_field: Option<&'static str>,
}

impl TrackForm {
    pub fn for_track(track: Track) -> &'static TrackForm {
        match track {
            Track::Organization => &ORGANIZATION,
            Track::Student => &STUDENT,
            Track::Poster => &POSTER,
        }
    }

    /// Required fields in declared order.
    pub fn required(&self) -> impl Iterator<Item = &'static FieldDef> {
        self.fields.iter().filter(|f| f.required)
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

const fn text(name: &'static str, label: &'static str, required: bool) -> FieldDef {
    FieldDef {
        name,
        label,
        kind: FieldKind::Text,
        required,
    }
}

const fn email(name: &'static str, label: &'static str, required: bool) -> FieldDef {
    FieldDef {
        name,
        label,
        kind: FieldKind::Email,
        required,
    }
}

const fn area(name: &'static str, label: &'static str, required: bool) -> FieldDef {
    FieldDef {
        name,
        label,
        kind: FieldKind::TextArea,
        required,
    }
}

const GRANT_NARRATIVE: [FieldDef; 9] = [
    area("q1_issue", "1) Public health issue addressed in Greater New Haven", false),
    area("q2_align", "2) Alignment with NHCMA Foundation mission", false),
    area("q3_benefit", "3) Direct benefit to Greater New Haven residents", false),
    text("project_title", "Project Title", true),
    area("description", "4) Detailed project description (objectives, methodology, expected outcomes)", false),
    area("budget_text", "5) Itemized budget (include any outside funding)", false),
    text("budget_total", "Budget total (USD)", false),
    area("timeline", "6) Project timeline (goal within 1 year of disbursement)", false),
    area("evaluation", "7) Evaluation plan (impact/outcomes in Greater New Haven)", false),
];

const ORGANIZATION_FIELDS: [FieldDef; 17] = [
    text("org_name", "Organization Name", true),
    text("applicant_name", "Applicant Name", true),
    email("email", "Applicant Email", true),
    text("phone", "Applicant Phone", true),
    text("exec_dir", "Executive Director (First/Last)", false),
    email("exec_email", "Executive Director Email", false),
    text("exec_phone", "Executive Director Phone", false),
    area("mission", "Organization Mission (brief)", false),
    GRANT_NARRATIVE[0],
    GRANT_NARRATIVE[1],
    GRANT_NARRATIVE[2],
    GRANT_NARRATIVE[3],
    GRANT_NARRATIVE[4],
    GRANT_NARRATIVE[5],
    GRANT_NARRATIVE[6],
    GRANT_NARRATIVE[7],
    GRANT_NARRATIVE[8],
];

pub const MEDICAL_SCHOOLS: &[&str] = &[
    SELECT_PLACEHOLDER,
    "Frank H. Netter MD School of Medicine at Quinnipiac University",
    "Yale School of Medicine",
];

const STUDENT_FIELDS: [FieldDef; 17] = [
    text("applicant_name", "Applicant Name", true),
    FieldDef {
        name: "school",
        label: "Medical School",
        kind: FieldKind::Select(MEDICAL_SCHOOLS),
        required: true,
    },
    text("grad_date", "Projected Graduation Date (MM/YYYY)", false),
    email("email", "School Email", true),
    text("phone", "Phone", true),
    text("advisor_name", "Advisor Name", false),
    text("advisor_title", "Advisor Title/Role", false),
    email("advisor_email", "Advisor Email", false),
    GRANT_NARRATIVE[0],
    GRANT_NARRATIVE[1],
    GRANT_NARRATIVE[2],
    GRANT_NARRATIVE[3],
    GRANT_NARRATIVE[4],
    GRANT_NARRATIVE[5],
    GRANT_NARRATIVE[6],
    GRANT_NARRATIVE[7],
    GRANT_NARRATIVE[8],
];

pub const POSTER_CATEGORIES: &[&str] = &[SELECT_PLACEHOLDER, "Student", "Resident", "Fellow"];

const POSTER_FIELDS: [FieldDef; 12] = [
    FieldDef {
        name: "category",
        label: "Category",
        kind: FieldKind::Select(POSTER_CATEGORIES),
        required: true,
    },
    text("lead_author", "Lead Author", true),
    email("contact_email", "Contact Email", true),
    text("institution_lead", "Institution (Lead)", false),
    text("coauthor1", "Co-Author 1", false),
    text("institution_co1", "Institution 1", false),
    text("coauthor2", "Co-Author 2", false),
    text("institution_co2", "Institution 2", false),
    text("coauthor3", "Co-Author 3", false),
    text("institution_co3", "Institution 3", false),
    text("title", "Title of Project", true),
    area("abstract", "Abstract (250 words max)", true),
];

static ORGANIZATION: TrackForm = TrackForm {
    track: Track::Organization,
    heading: "Organization Application (2025)",
    fields: &ORGANIZATION_FIELDS,
    eligibility: &[
        CheckboxDef {
            name: "elig_nonprofit",
            key: "nonprofit",
            label: "Organization is a not-for-profit.",
        },
        CheckboxDef {
            name: "elig_report",
            key: "report_at_winter_meeting_2025",
            label: "Recipient will present final report at the NHCMA winter meeting in 2025 (date TBA).",
        },
        CheckboxDef {
            name: "elig_benefit",
            key: "benefit_gnh",
            label: "Funding will benefit residents of the Greater New Haven area.",
        },
    ],
    attachments: &[
        AttachmentSlot {
            field: "proposal_file",
            role: "proposal",
            prefix: "org_proposal",
            label: "Proposal / Narrative",
            accept: ".pdf,.doc,.docx",
        },
        AttachmentSlot {
            field: "budget_file",
            role: "budget",
            prefix: "org_budget",
            label: "Budget",
            accept: ".pdf,.xls,.xlsx,.csv",
        },
        AttachmentSlot {
            field: "other_file",
            role: "other",
            prefix: "org_other",
            label: "Additional Materials (letters of support, etc.)",
            accept: ".pdf,.doc,.docx,.zip",
        },
    ],
    identity: IdentityFields {
        name: "applicant_name",
        email: "email",
        phone: Some("phone"),
    },
    default_content_type: "application/octet-stream",
    word_limited_field: None,
};

static STUDENT: TrackForm = TrackForm {
    track: Track::Student,
    heading: "Medical Student Application (2025)",
    fields: &STUDENT_FIELDS,
    eligibility: &[
        CheckboxDef {
            name: "elig_enrolled",
            key: "enrolled_qu_yale",
            label: "I am currently enrolled at Quinnipiac (Netter) or Yale SOM.",
        },
        CheckboxDef {
            name: "elig_report",
            key: "report_at_winter_meeting_2025",
            label: "If awarded, I will present results at the NHCMA winter meeting in 2025 (date TBA).",
        },
    ],
    attachments: &[
        AttachmentSlot {
            field: "proposal_file",
            role: "proposal",
            prefix: "stu_proposal",
            label: "Proposal / Narrative",
            accept: ".pdf,.doc,.docx",
        },
        AttachmentSlot {
            field: "budget_file",
            role: "budget",
            prefix: "stu_budget",
            label: "Budget",
            accept: ".pdf,.xls,.xlsx,.csv",
        },
        AttachmentSlot {
            field: "cv_file",
            role: "cv",
            prefix: "stu_cv",
            label: "Curriculum Vitae",
            accept: ".pdf,.doc,.docx",
        },
        AttachmentSlot {
            field: "support_letter_file",
            role: "support_letter",
            prefix: "stu_support",
            label: "Letter of Support (optional)",
            accept: ".pdf,.doc,.docx",
        },
    ],
    identity: IdentityFields {
        name: "applicant_name",
        email: "email",
        phone: Some("phone"),
    },
    default_content_type: "application/octet-stream",
    word_limited_field: None,
};

static POSTER: TrackForm = TrackForm {
    track: Track::Poster,
    heading: "Research Poster Submission",
    fields: &POSTER_FIELDS,
    eligibility: &[],
    attachments: &[AttachmentSlot {
        field: "poster_file",
        role: "poster",
        prefix: "posters",
        label: "Poster (PDF, optional)",
        accept: ".pdf",
    }],
    identity: IdentityFields {
        name: "lead_author",
        email: "contact_email",
        phone: None,
    },
    default_content_type: "application/pdf",
    word_limited_field: Some("abstract"),
};
