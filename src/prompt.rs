//! System-prompt construction.
//!
//! The prompt is assembled from independent sections so each one can be
//! tested on its own. The grounding section is appended only when the
//! assembled context is non-empty; with no documents selected, the prompt
//! carries no grounding text at all.

use chrono::{DateTime, Datelike, Timelike};
use chrono_tz::Tz;
use serde::Deserialize;

use campus_assist_core::action::{BLOCK_END, BLOCK_START};
use campus_assist_core::overrides::{INTERNSHIP_FILES, SCHEDULE_FILES};

const DAYS: [&str; 7] = [
    "Pazartesi",
    "Salı",
    "Çarşamba",
    "Perşembe",
    "Cuma",
    "Cumartesi",
    "Pazar",
];

const MONTHS: [&str; 12] = [
    "Ocak", "Şubat", "Mart", "Nisan", "Mayıs", "Haziran", "Temmuz", "Ağustos", "Eylül", "Ekim",
    "Kasım", "Aralık",
];

const IDENTITY_ANSWER: &str = "Merhaba! Ben Kırşehir Ahi Evran Üniversitesi tarafından geliştirilmiş, \
    Çiçekdağı Meslek Yüksekokulu idari süreçleri için özelleştirilmiş bir yapay zeka asistanıyım. \
    Size nasıl yardımcı olabilirim?";

/// Caller profile as sent by the chat client. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub surname: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub student_no: Option<String>,
}

impl UserProfile {
    /// `student` unless the caller says otherwise.
    pub fn role(&self) -> &str {
        non_empty(&self.role).unwrap_or("student")
    }
}

/// Location and weather reported by the client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Weather {
    pub location_name: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    pub temp: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
    /// WMO weather code.
    #[serde(default)]
    pub code: Option<u32>,
}

fn default_unit() -> String {
    "°C".to_string()
}

pub struct PromptInput<'a> {
    pub now: DateTime<Tz>,
    pub user: Option<&'a UserProfile>,
    pub weather: Option<&'a Weather>,
    pub context: &'a str,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Full Turkish date and time, e.g. `7 Mart 2025 Cuma 14:05`.
pub fn format_datetime(now: &DateTime<Tz>) -> String {
    format!(
        "{} {} {} {} {:02}:{:02}",
        now.day(),
        MONTHS[now.month0() as usize],
        now.year(),
        weekday_name(now),
        now.hour(),
        now.minute()
    )
}

pub fn weekday_name(now: &DateTime<Tz>) -> &'static str {
    DAYS[now.weekday().num_days_from_monday() as usize]
}

/// Plain-language description of a WMO weather code.
pub fn describe_weather_code(code: u32) -> &'static str {
    match code {
        0 => "açık",
        1..=3 => "parçalı bulutlu",
        45 | 48 => "sisli",
        51 | 53 | 55 => "çiseleyen yağmurlu",
        61 | 63 | 65 => "yağmurlu",
        71 | 73 | 75 => "karlı",
        95 | 96 | 99 => "fırtınalı",
        _ => "bilinmiyor",
    }
}

fn identity_section(now: &DateTime<Tz>) -> String {
    format!(
        "Sen Çiçekdağı Meslek Yüksekokulu idari asistanısın.\n\
         ŞU ANKİ TARİH VE SAAT: {}\n\
         BUGÜN GÜNLERDEN: {}\n\
         Tarih ve saat sorularında yalnızca bu bilgiyi kullan, başka bir tarih uydurma.\n\n\
         Cevapların kısa, öz ve net olsun. Kullanıcının sorusuna doğrudan odaklan.\n\n\
         Kullanıcı senin kim olduğunu sorarsa tam olarak şu cevabı ver:\n\"{}\"",
        format_datetime(now),
        weekday_name(now),
        IDENTITY_ANSWER
    )
}

fn location_section(weather: Option<&Weather>) -> String {
    let Some(w) = weather else {
        return "Konum bilgisi alınamadı. Kullanıcı hava durumu veya konum sorarsa \
                \"Konum izni verirseniz size yardımcı olabilirim.\" de."
            .to_string();
    };

    let coords = match (w.lat, w.lon) {
        (Some(lat), Some(lon)) => format!(" ({:.4}, {:.4})", lat, lon),
        _ => String::new(),
    };
    let condition = w
        .code
        .map(describe_weather_code)
        .unwrap_or("bilinmiyor");

    format!(
        "KULLANICI KONUM VE ORTAM BİLGİSİ:\n\
         Tespit Edilen Konum: {}{}\n\
         Sıcaklık: {}{}\n\
         Hava Durumu: {}\n\
         Kullanıcının konumu ile okulun konumu farklı olabilir, ikisini karıştırma.",
        w.location_name, coords, w.temp, w.unit, condition
    )
}

fn profile_section(user: Option<&UserProfile>) -> String {
    let default = UserProfile::default();
    let user = user.unwrap_or(&default);
    let full_name = match (non_empty(&user.name), non_empty(&user.surname)) {
        (Some(name), Some(surname)) => format!("{} {}", name, surname),
        (Some(name), None) => name.to_string(),
        _ => "Misafir".to_string(),
    };
    let role = user.role();
    let tone = match role {
        "academic" => "Hitap: \"Sayın Hocam\". Ton: saygılı, resmi, profesyonel ve kısa.",
        _ => "Hitap: \"Sevgili Öğrenci\" veya ismiyle. Ton: yardımsever, yönlendirici ve sabırlı.",
    };

    format!(
        "KONUŞTUĞUN KİŞİ HAKKINDA BİLGİ (KULLANICI PROFİLİ):\n\
         - İsim Soyisim: {}\n\
         - Rol: {}\n\
         - Unvan: {}\n\
         - Bölüm/Program: {}\n\
         - Öğrenci No: {}\n\
         Kullanıcı kendi kimliğini sorarsa bu bilgileri kullan.\n\
         {}",
        full_name,
        role,
        non_empty(&user.title).unwrap_or("Yok"),
        non_empty(&user.department).unwrap_or("Belirtilmemiş"),
        non_empty(&user.student_no).unwrap_or("Yok"),
        tone
    )
}

fn forms_section() -> String {
    let mut out = String::from(
        "STAJ BAŞVURU FORMU KURALI:\n\
         Kullanıcı staj başvuru formu isterse bölümünü kontrol et ve yalnızca o bölüme ait \
         dosyayı ver. Bölüm belli değilse sor.\n",
    );
    for file in INTERNSHIP_FILES {
        out.push_str(&format!("- {}\n", file));
    }
    out.push_str(
        "\nDERS PROGRAMI KURALI:\n\
         Her seferinde yalnızca tek bir ders programı dosyası sun. Veterinerlik bölümü için \
         önce şubeyi (1. Şube, 2. Şube, Eski Müfredat) sor.\n",
    );
    for file in SCHEDULE_FILES {
        out.push_str(&format!("- {}\n", file));
    }
    out
}

fn protocol_section() -> String {
    format!(
        "DOSYA KURALI:\n\
         1. Kullanıcının ihtiyacına en uygun belgeyi bulunan belgeler arasından seç.\n\
         2. Kullanıcı belgeyi istediğinde cevabını belgenin TAM DOSYA ADI ile şu formatta bitir:\n\
         {}\n\
         {{\"action\": \"generate_file\", \"filename\": \"BULUNAN_DOSYA_ADI\", \"data\": {{}}}}\n\
         {}\n\
         3. Kullanıcı belgeyi kendisi için doldurmanı isterse bu özelliğin bir sonraki sürümde \
         geleceğini söyle ve yine de boş belgeyi aynı formatta ver.\n\
         4. Cevapların Türkçe, resmi ve yardımsever olsun.",
        BLOCK_START, BLOCK_END
    )
}

/// Build the system prompt for one chat turn.
pub fn build_system_prompt(input: &PromptInput<'_>) -> String {
    let mut sections = vec![
        identity_section(&input.now),
        location_section(input.weather),
        profile_section(input.user),
        forms_section(),
        protocol_section(),
    ];

    if !input.context.is_empty() {
        sections.push(format!("BAĞLAM:\n{}", input.context));
    }

    sections.join("\n\n")
}
