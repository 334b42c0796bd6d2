//! Canned advice shown with a classification, and the result message layout.

use crate::record::{PredictionResult, RiskLevel};

pub struct Hospital {
    pub name: &'static str,
    pub location: &'static str,
    pub specialist: &'static str,
    pub contact: &'static str,
}

pub struct Prevention {
    pub category: &'static str,
    pub tips: &'static [&'static str],
}

pub struct HighRiskBundle {
    pub title: &'static str,
    pub advice: &'static str,
    pub hospitals: &'static [Hospital],
}

pub struct LowRiskBundle {
    pub title: &'static str,
    pub advice: &'static str,
    pub preventions: &'static [Prevention],
}

pub static HIGH_RISK_BUNDLE: HighRiskBundle = HighRiskBundle {
    title: "Rekomendasi untuk Risiko Tinggi Penyakit Jantung",
    advice: "Segera konsultasikan hasil ini dengan dokter spesialis jantung. Jangan menunda pemeriksaan medis lebih lanjut. Perubahan gaya hidup HARUS segera dilakukan bersamaan dengan konsultasi medis profesional.",
    hospitals: &[
        Hospital {
            name: "Rumah Sakit Jantung dan Pembuluh Darah Harapan Kita",
            location: "Jakarta",
            specialist: "Pusat rujukan nasional untuk penyakit kardiovaskular",
            contact: "(021) 5684085",
        },
        Hospital {
            name: "Rumah Sakit Jantung Diagram",
            location: "Jakarta",
            specialist: "Spesialis kardiologi intervensi",
            contact: "(021) 30061114",
        },
        Hospital {
            name: "Rumah Sakit Umum Pusat Dr. Sardjito",
            location: "Yogyakarta",
            specialist: "Pusat kardiologi terkemuka di Jawa Tengah",
            contact: "(0274) 587333",
        },
        Hospital {
            name: "Rumah Sakit Umum Pusat Dr. Hasan Sadikin",
            location: "Bandung",
            specialist: "Pusat rujukan jantung di Jawa Barat",
            contact: "(022) 2034953",
        },
        Hospital {
            name: "Rumah Sakit Umum Pusat Dr. Wahidin Sudirohusodo",
            location: "Makassar",
            specialist: "Pusat rujukan kardiovaskular di Indonesia Timur",
            contact: "(0411) 584677",
        },
    ],
};

pub static LOW_RISK_BUNDLE: LowRiskBundle = LowRiskBundle {
    title: "Rekomendasi untuk Menjaga Kesehatan Jantung",
    advice: "Meskipun risiko Anda rendah, tetap penting untuk menjaga kesehatan jantung dengan gaya hidup sehat. Konsultasikan dengan dokter untuk pemeriksaan rutin sesuai usia dan faktor risiko Anda.",
    preventions: &[
        Prevention {
            category: "Pola Makan",
            tips: &[
                "Terapkan pola makan DASH (Dietary Approaches to Stop Hypertension) atau Mediterania",
                "Batasi konsumsi garam hingga <5g per hari",
                "Konsumsi makanan kaya serat, buah, sayuran, dan biji-bijian utuh",
                "Batasi lemak jenuh dan trans, pilih lemak sehat seperti minyak zaitun dan alpukat",
                "Perbanyak konsumsi ikan berlemak (salmon, makarel) yang kaya omega-3",
            ],
        },
        Prevention {
            category: "Aktivitas Fisik",
            tips: &[
                "Lakukan minimal 150 menit aktivitas fisik intensitas sedang per minggu",
                "Lakukan latihan kardio (jalan cepat, berenang, bersepeda) 3-5 kali seminggu",
                "Tambahkan latihan kekuatan 2 kali seminggu",
                "Hindari duduk terlalu lama, lakukan peregangan setiap 30-60 menit",
            ],
        },
        Prevention {
            category: "Manajemen Stres",
            tips: &[
                "Praktikkan teknik relaksasi seperti meditasi mindfulness",
                "Latihan pernapasan dalam selama 10 menit setiap hari",
                "Prioritaskan tidur berkualitas 7-8 jam per malam",
                "Jaga keseimbangan kehidupan kerja dan pribadi",
            ],
        },
        Prevention {
            category: "Pemeriksaan Rutin",
            tips: &[
                "Periksa tekanan darah secara teratur",
                "Lakukan tes kolesterol setahun sekali",
                "Periksa gula darah secara berkala",
                "Skrining jantung sesuai rekomendasi dokter",
            ],
        },
    ],
};

pub const HOSPITALS_HEADING: &str = "### Rumah Sakit yang Direkomendasikan:";

fn high_risk_section() -> String {
    let bundle = &HIGH_RISK_BUNDLE;
    let hospitals = bundle
        .hospitals
        .iter()
        .map(|h| {
            format!(
                "- **{}** ({})\n  {}\n  Kontak: {}",
                h.name, h.location, h.specialist, h.contact
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "## {}\n\n{}\n\n{HOSPITALS_HEADING}\n\n{}\n\nSegera hubungi fasilitas kesehatan terdekat atau dokter spesialis jantung untuk evaluasi lebih lanjut. Kondisi ini memerlukan perhatian medis.",
        bundle.title, bundle.advice, hospitals
    )
}

fn low_risk_section() -> String {
    let bundle = &LOW_RISK_BUNDLE;
    let preventions = bundle
        .preventions
        .iter()
        .map(|p| {
            let tips = p
                .tips
                .iter()
                .map(|tip| format!("- {tip}"))
                .collect::<Vec<_>>()
                .join("\n");
            format!("### {}:\n{}", p.category, tips)
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "## {}\n\n{}\n\n{}\n\nTetap jaga kesehatan jantung Anda dengan pemeriksaan rutin dan gaya hidup sehat.",
        bundle.title, bundle.advice, preventions
    )
}

/// Full result message: verdict headline, then the bundle for the risk class.
pub fn result_message(result: &PredictionResult) -> String {
    let (verdict, section) = match result.risk() {
        RiskLevel::High => ("🚨 RISIKO TINGGI", high_risk_section()),
        RiskLevel::Low => ("✅ RISIKO RENDAH", low_risk_section()),
    };

    format!(
        "# Hasil Analisis Risiko Penyakit Jantung\n\nBerdasarkan data yang Anda berikan, tingkat risiko penyakit jantung Anda adalah:\n## {verdict}\n\n{section}\n\nTerima kasih telah menggunakan Heartlyzer. Jika ingin melakukan analisis ulang, ketik \"Mulai lagi\"."
    )
}
