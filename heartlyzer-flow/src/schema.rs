//! Static questionnaire definition and the per-kind validate/normalize rules.
//!
//! The schema is plain data: every behaviour dispatches on [`FieldKind`], so a
//! field never carries its own closures and the whole table can be listed,
//! serialized, and tested on its own.

use serde::{Deserialize, Serialize};

use crate::error::{FlowError, Result};

const YES_WORDS: [&str; 3] = ["ya", "yes", "true"];
const NO_WORDS: [&str; 3] = ["tidak", "no", "false"];

/// Input kind of a question together with its accepted domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    /// Integer within an inclusive range.
    Number {
        min: u32,
        max: u32,
        unit: &'static str,
    },
    /// Yes/no in Indonesian or English.
    Boolean,
    /// One of a fixed, case-insensitive option set. Options are stored in
    /// their canonical spelling.
    Select { options: &'static [&'static str] },
}

/// A normalized answer as stored in the interview and submitted upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Number(u32),
    Flag(bool),
    Choice(String),
}

/// One survey question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub id: &'static str,
    pub prompt: &'static str,
    pub explanation: &'static str,
    pub example: &'static str,
    pub kind: FieldKind,
}

impl FieldKind {
    pub fn validate(&self, raw: &str) -> bool {
        let raw = raw.trim();
        match self {
            FieldKind::Number { min, max, .. } => raw
                .parse::<i64>()
                .map(|n| n >= i64::from(*min) && n <= i64::from(*max))
                .unwrap_or(false),
            FieldKind::Boolean => {
                let lowered = raw.to_lowercase();
                YES_WORDS.contains(&lowered.as_str()) || NO_WORDS.contains(&lowered.as_str())
            }
            FieldKind::Select { options } => options
                .iter()
                .any(|option| option.eq_ignore_ascii_case(raw)),
        }
    }

    /// Converts an accepted raw input into its canonical value.
    ///
    /// Returns `None` for input that [`FieldKind::validate`] rejects.
    pub fn normalize(&self, raw: &str) -> Option<AnswerValue> {
        if !self.validate(raw) {
            return None;
        }
        let raw = raw.trim();
        match self {
            FieldKind::Number { .. } => raw.parse::<u32>().ok().map(AnswerValue::Number),
            FieldKind::Boolean => Some(AnswerValue::Flag(
                YES_WORDS.contains(&raw.to_lowercase().as_str()),
            )),
            FieldKind::Select { options } => options
                .iter()
                .find(|option| option.eq_ignore_ascii_case(raw))
                .map(|option| AnswerValue::Choice(option.to_string())),
        }
    }

    /// Field-specific hint shown when an answer is rejected.
    pub fn error_hint(&self) -> String {
        match self {
            FieldKind::Number { min, max, unit } => {
                format!("Masukkan nilai antara {min}-{max} {unit}")
            }
            FieldKind::Boolean => "Pilih Ya atau Tidak".to_string(),
            FieldKind::Select { options } => format!("Pilih {}", list_options(options)),
        }
    }
}

impl FieldSpec {
    /// Validates and normalizes in one step.
    pub fn accept(&self, raw: &str) -> Result<AnswerValue> {
        self.kind
            .normalize(raw)
            .ok_or_else(|| FlowError::InvalidAnswer {
                field: self.id.to_string(),
                value: raw.to_string(),
            })
    }

    /// Question text, explanation and example, one paragraph each.
    pub fn prompt_message(&self) -> String {
        format!("{}\n\n{}\n\n{}", self.prompt, self.explanation, self.example)
    }

    pub fn error_message(&self) -> String {
        format!(
            "{}. Mohon jawab sesuai format yang diminta.",
            self.kind.error_hint()
        )
    }
}

/// "Low, Middle, atau High" / "Male atau Female".
fn list_options(options: &[&str]) -> String {
    match options {
        [] => String::new(),
        [only] => only.to_string(),
        [first, second] => format!("{first} atau {second}"),
        [init @ .., last] => format!("{}, atau {last}", init.join(", ")),
    }
}

pub fn field_count() -> usize {
    FIELDS.len()
}

pub fn field(index: usize) -> Option<&'static FieldSpec> {
    FIELDS.get(index)
}

pub fn field_by_id(id: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|f| f.id == id)
}

const LOW_MODERATE_HIGH: &[&str] = &["Low", "Moderate", "High"];

/// The questionnaire, in asking order.
pub static FIELDS: &[FieldSpec] = &[
    FieldSpec {
        id: "age",
        prompt: "Berapa usia Anda saat ini?",
        explanation: "Usia adalah faktor risiko penting untuk penyakit jantung. Risiko meningkat seiring bertambahnya usia.",
        example: "Contoh: 45",
        kind: FieldKind::Number { min: 18, max: 100, unit: "tahun" },
    },
    FieldSpec {
        id: "gender",
        prompt: "Apa jenis kelamin Anda?",
        explanation: "Pria memiliki risiko lebih tinggi terkena penyakit jantung dibandingkan wanita sebelum menopause.",
        example: "Ketik: Male atau Female",
        kind: FieldKind::Select { options: &["Male", "Female"] },
    },
    FieldSpec {
        id: "region",
        prompt: "Apakah Anda tinggal di daerah perkotaan atau pedesaan?",
        explanation: "Lingkungan tempat tinggal dapat mempengaruhi faktor risiko seperti tingkat stres dan polusi.",
        example: "Ketik: Urban (perkotaan) atau Rural (pedesaan)",
        kind: FieldKind::Select { options: &["Urban", "Rural"] },
    },
    FieldSpec {
        id: "income_level",
        prompt: "Bagaimana tingkat pendapatan Anda?",
        explanation: "Status sosial ekonomi dapat mempengaruhi akses ke layanan kesehatan dan pola makan.",
        example: "Ketik: Low (rendah), Middle (menengah), atau High (tinggi)",
        kind: FieldKind::Select { options: &["Low", "Middle", "High"] },
    },
    FieldSpec {
        id: "hypertension",
        prompt: "Apakah Anda memiliki hipertensi (tekanan darah tinggi)?",
        explanation: "Hipertensi meningkatkan risiko penyakit jantung dengan merusak pembuluh darah dari waktu ke waktu.",
        example: "Ketik: Ya atau Tidak",
        kind: FieldKind::Boolean,
    },
    FieldSpec {
        id: "diabetes",
        prompt: "Apakah Anda menderita diabetes?",
        explanation: "Diabetes dapat merusak pembuluh darah dan saraf yang mengendalikan jantung.",
        example: "Ketik: Ya atau Tidak",
        kind: FieldKind::Boolean,
    },
    FieldSpec {
        id: "cholesterol_level",
        prompt: "Berapa kadar kolesterol total Anda? (dalam mg/dL)",
        explanation: "Kolesterol tinggi dapat menyebabkan penumpukan plak di arteri, meningkatkan risiko penyakit jantung.",
        example: "Contoh: 200 (nilai normal <200, batas tinggi 200-239, tinggi ≥240)",
        kind: FieldKind::Number { min: 100, max: 300, unit: "mg/dL" },
    },
    FieldSpec {
        id: "obesity",
        prompt: "Apakah Anda mengalami obesitas? (BMI ≥ 30)",
        explanation: "Obesitas meningkatkan risiko hipertensi, diabetes, dan kolesterol tinggi.",
        example: "Ketik: Ya atau Tidak (BMI = berat (kg) / tinggi² (m))",
        kind: FieldKind::Boolean,
    },
    FieldSpec {
        id: "waist_circumference",
        prompt: "Berapa lingkar pinggang Anda? (dalam cm)",
        explanation: "Lingkar pinggang yang besar (>90cm untuk pria atau >80cm untuk wanita di Asia) berkaitan dengan risiko penyakit kardiovaskular.",
        example: "Contoh: 85",
        kind: FieldKind::Number { min: 50, max: 150, unit: "cm" },
    },
    FieldSpec {
        id: "family_history",
        prompt: "Apakah ada riwayat penyakit jantung dalam keluarga Anda?",
        explanation: "Riwayat keluarga dengan penyakit jantung meningkatkan risiko Anda mengalami kondisi yang sama.",
        example: "Ketik: Ya atau Tidak",
        kind: FieldKind::Boolean,
    },
    FieldSpec {
        id: "smoking_status",
        prompt: "Bagaimana status merokok Anda?",
        explanation: "Merokok merusak pembuluh darah dan mengurangi kadar oksigen dalam darah.",
        example: "Ketik: Never (tidak pernah), Past (pernah), atau Current (saat ini)",
        kind: FieldKind::Select { options: &["Never", "Past", "Current"] },
    },
    FieldSpec {
        id: "alcohol_consumption",
        prompt: "Bagaimana tingkat konsumsi alkohol Anda?",
        explanation: "Konsumsi alkohol berlebihan dapat meningkatkan tekanan darah dan risiko penyakit jantung.",
        example: "Ketik: None (tidak), Moderate (sedang), atau High (tinggi)",
        kind: FieldKind::Select { options: &["None", "Moderate", "High"] },
    },
    FieldSpec {
        id: "physical_activity",
        prompt: "Bagaimana tingkat aktivitas fisik Anda?",
        explanation: "Aktivitas fisik teratur membantu menjaga kesehatan jantung dan mengurangi risiko.",
        example: "Ketik: Low (rendah), Moderate (sedang), atau High (tinggi)",
        kind: FieldKind::Select { options: LOW_MODERATE_HIGH },
    },
    FieldSpec {
        id: "dietary_habits",
        prompt: "Bagaimana pola makan Anda secara umum?",
        explanation: "Pola makan sehat yang kaya sayuran, buah, dan rendah lemak jenuh penting untuk kesehatan jantung.",
        example: "Ketik: Healthy (sehat) atau Unhealthy (tidak sehat)",
        kind: FieldKind::Select { options: &["Healthy", "Unhealthy"] },
    },
    FieldSpec {
        id: "air_pollution_exposure",
        prompt: "Bagaimana tingkat paparan polusi udara di lingkungan Anda?",
        explanation: "Paparan polusi udara jangka panjang dikaitkan dengan peningkatan risiko penyakit kardiovaskular.",
        example: "Ketik: Low (rendah), Moderate (sedang), atau High (tinggi)",
        kind: FieldKind::Select { options: LOW_MODERATE_HIGH },
    },
    FieldSpec {
        id: "stress_level",
        prompt: "Bagaimana tingkat stres Anda?",
        explanation: "Stres kronis dapat meningkatkan tekanan darah dan kadar hormon stres yang mempengaruhi kesehatan jantung.",
        example: "Ketik: Low (rendah), Moderate (sedang), atau High (tinggi)",
        kind: FieldKind::Select { options: LOW_MODERATE_HIGH },
    },
    FieldSpec {
        id: "sleep_hours",
        prompt: "Berapa rata-rata jam tidur Anda per malam?",
        explanation: "Kualitas tidur yang baik penting untuk pemulihan jantung dan pembuluh darah.",
        example: "Contoh: 7",
        kind: FieldKind::Number { min: 3, max: 12, unit: "jam" },
    },
    FieldSpec {
        id: "blood_pressure_systolic",
        prompt: "Berapa tekanan darah sistolik Anda? (angka atas, dalam mmHg)",
        explanation: "Tekanan darah tinggi adalah faktor risiko utama penyakit jantung. Sistolik normal <120 mmHg.",
        example: "Contoh: 120",
        kind: FieldKind::Number { min: 90, max: 200, unit: "mmHg" },
    },
    FieldSpec {
        id: "blood_pressure_diastolic",
        prompt: "Berapa tekanan darah diastolik Anda? (angka bawah, dalam mmHg)",
        explanation: "Diastolik normal <80 mmHg. Kedua nilai tekanan darah penting untuk kesehatan jantung.",
        example: "Contoh: 80",
        kind: FieldKind::Number { min: 60, max: 120, unit: "mmHg" },
    },
    FieldSpec {
        id: "fasting_blood_sugar",
        prompt: "Berapa kadar gula darah puasa Anda? (dalam mg/dL)",
        explanation: "Kadar gula darah puasa normal <100 mg/dL. Kadar tinggi dapat menunjukkan risiko diabetes.",
        example: "Contoh: 95",
        kind: FieldKind::Number { min: 70, max: 200, unit: "mg/dL" },
    },
    FieldSpec {
        id: "cholesterol_hdl",
        prompt: "Berapa kadar kolesterol HDL (kolesterol baik) Anda? (dalam mg/dL)",
        explanation: "HDL tinggi (>60 mg/dL) bersifat protektif terhadap penyakit jantung.",
        example: "Contoh: 50",
        kind: FieldKind::Number { min: 20, max: 100, unit: "mg/dL" },
    },
    FieldSpec {
        id: "cholesterol_ldl",
        prompt: "Berapa kadar kolesterol LDL (kolesterol jahat) Anda? (dalam mg/dL)",
        explanation: "LDL tinggi (>100 mg/dL) meningkatkan risiko penyakit jantung.",
        example: "Contoh: 120",
        kind: FieldKind::Number { min: 50, max: 200, unit: "mg/dL" },
    },
    FieldSpec {
        id: "triglycerides",
        prompt: "Berapa kadar trigliserida Anda? (dalam mg/dL)",
        explanation: "Trigliserida tinggi (>150 mg/dL) dapat meningkatkan risiko penyakit jantung.",
        example: "Contoh: 140",
        kind: FieldKind::Number { min: 50, max: 300, unit: "mg/dL" },
    },
    FieldSpec {
        id: "ekg_results",
        prompt: "Bagaimana hasil EKG (elektrokardiogram) terakhir Anda?",
        explanation: "EKG dapat mendeteksi masalah jantung seperti aritmia atau tanda serangan jantung sebelumnya.",
        example: "Ketik: Normal atau Abnormal",
        kind: FieldKind::Select { options: &["Normal", "Abnormal"] },
    },
    FieldSpec {
        id: "previous_heart_disease",
        prompt: "Apakah Anda pernah didiagnosis dengan penyakit jantung sebelumnya?",
        explanation: "Riwayat penyakit jantung meningkatkan risiko masalah jantung di masa depan.",
        example: "Ketik: Ya atau Tidak",
        kind: FieldKind::Boolean,
    },
    FieldSpec {
        id: "medication_usage",
        prompt: "Apakah Anda menggunakan obat-obatan untuk kondisi jantung?",
        explanation: "Pengobatan dapat mengendalikan faktor risiko dan mencegah perkembangan penyakit jantung.",
        example: "Ketik: Ya atau Tidak",
        kind: FieldKind::Boolean,
    },
    FieldSpec {
        id: "participated_in_free_screening",
        prompt: "Apakah Anda pernah mengikuti program skrining kesehatan jantung gratis?",
        explanation: "Skrining jantung dapat membantu deteksi dini masalah jantung.",
        example: "Ketik: Ya atau Tidak",
        kind: FieldKind::Boolean,
    },
    FieldSpec {
        id: "heart_attack",
        prompt: "Apakah Anda pernah mengalami serangan jantung sebelumnya?",
        explanation: "Riwayat serangan jantung meningkatkan risiko serangan jantung berikutnya.",
        example: "Ketik: Ya atau Tidak",
        kind: FieldKind::Boolean,
    },
];
