//! Seed Data
//!
//! Starting content for a fresh installation: the job board falls back to
//! these jobs when nothing valid is stored, and the professional list is the
//! static recommendation list shown next to a job.

use chrono::{DateTime, Duration, Utc};

use super::job::{Job, JobStatus, LocalizedText, TimelineEntry, TimelineKind, Urgency};
use super::professional::{Professional, VerificationLevel};

fn hours_ago(now: DateTime<Utc>, hours: i64) -> DateTime<Utc> {
    now - Duration::hours(hours)
}

fn created(now: DateTime<Utc>, hours: i64) -> TimelineEntry {
    TimelineEntry::new(
        TimelineKind::Created,
        LocalizedText::new("工單建立", "Request created", "Anfrage erstellt"),
        hours_ago(now, hours),
    )
}

pub fn sample_professionals(now: DateTime<Utc>) -> Vec<Professional> {
    vec![
        Professional {
            id: "pro-li-jianhong".to_string(),
            name: "李建宏".to_string(),
            trade: "機電工程技師".to_string(),
            years_of_experience: 12,
            rating: 4.8,
            completed_jobs: 186,
            certifications: vec!["丙級電匠".to_string(), "甲級消防設備士".to_string()],
            service_areas: vec!["台北市".to_string(), "新北市".to_string(), "桃園市".to_string()],
            availability: "週一至週六 08:00-18:00".to_string(),
            introduction: "專精中央空調與消防系統維護".to_string(),
            verification_level: VerificationLevel::Enhanced,
            verified_at: Some(hours_ago(now, 24 * 60)),
            verification_notes: Some("實地查核設備與證照文件".to_string()),
        },
        Professional {
            id: "pro-huang-yating".to_string(),
            name: "黃雅婷".to_string(),
            trade: "防水工程師".to_string(),
            years_of_experience: 9,
            rating: 4.6,
            completed_jobs: 142,
            certifications: vec!["防水施工專業技術士".to_string()],
            service_areas: vec!["桃園市".to_string(), "新竹市".to_string()],
            availability: "週一至週五 09:00-17:00".to_string(),
            introduction: "擅長屋頂防水與外牆補漏".to_string(),
            verification_level: VerificationLevel::Basic,
            verified_at: Some(hours_ago(now, 24 * 21)),
            verification_notes: None,
        },
        Professional {
            id: "pro-chen-junxiang".to_string(),
            name: "陳俊祥".to_string(),
            trade: "結構補強技師".to_string(),
            years_of_experience: 15,
            rating: 4.9,
            completed_jobs: 204,
            certifications: vec!["土木技師證照".to_string()],
            service_areas: vec!["台北市".to_string(), "基隆市".to_string()],
            availability: "可配合夜間及週末緊急工程".to_string(),
            introduction: "專注老屋結構補強與耐震評估".to_string(),
            verification_level: VerificationLevel::Pending,
            verified_at: None,
            verification_notes: None,
        },
    ]
}

pub fn sample_jobs(now: DateTime<Utc>) -> Vec<Job> {
    vec![
        Job {
            id: "job-hvac-leak".to_string(),
            title: "商辦大樓冷氣漏水檢修".to_string(),
            category: "機電工程".to_string(),
            description: "20 樓中央空調排水疑似堵塞，天花板出現滲水痕跡".to_string(),
            location: "台北市信義區松高路 101 號 20 樓".to_string(),
            preferred_schedule: "希望 3 天內進場，施工時間 20:00-24:00".to_string(),
            budget_range: Some("35,000 - 50,000".to_string()),
            urgency: Urgency::Urgent,
            status: JobStatus::Matching,
            assigned_professional_id: None,
            timeline: vec![
                created(now, 20),
                TimelineEntry::new(
                    TimelineKind::Update,
                    LocalizedText::new(
                        "補充現場照片 3 張",
                        "Uploaded 3 site photos",
                        "3 Fotos vom Einsatzort hochgeladen",
                    ),
                    hours_ago(now, 4),
                ),
            ],
        },
        Job {
            id: "job-firepump-maintenance".to_string(),
            title: "地下室消防泵浦保養".to_string(),
            category: "消防工程".to_string(),
            description: "年度消防設備保養，泵浦異常震動，需檢查軸承與壓力錶".to_string(),
            location: "新北市板橋區民生路 200 號 B2".to_string(),
            preferred_schedule: "下週一至週三 09:00-17:00".to_string(),
            budget_range: Some("25,000 - 30,000".to_string()),
            urgency: Urgency::Normal,
            status: JobStatus::Assigned,
            assigned_professional_id: Some("pro-li-jianhong".to_string()),
            timeline: vec![
                created(now, 48),
                TimelineEntry::new(
                    TimelineKind::Update,
                    LocalizedText::new(
                        "已指派 李建宏 技師",
                        "Assigned to Li Jianhong",
                        "Li Jianhong zugewiesen",
                    ),
                    hours_ago(now, 40),
                ),
            ],
        },
        Job {
            id: "job-roof-waterproof".to_string(),
            title: "屋頂防水層翻修".to_string(),
            category: "防水工程".to_string(),
            description: "透天厝屋頂老化，雨天滲漏，需重新做 PU 防水".to_string(),
            location: "桃園市中壢區環北路 66 號".to_string(),
            preferred_schedule: "希望 2 週內開工，週一至週五 09:00-17:00".to_string(),
            budget_range: Some("80,000 - 120,000".to_string()),
            urgency: Urgency::Normal,
            status: JobStatus::AwaitingReview,
            assigned_professional_id: Some("pro-huang-yating".to_string()),
            timeline: vec![created(now, 24 * 5)],
        },
    ]
}
