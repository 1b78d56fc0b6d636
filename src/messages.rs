//! User-facing texts (Uzbek)

use std::str::FromStr;

use indoc::{formatdoc, indoc};

use crate::kruzhok::history::HistoryEntry;
use crate::kruzhok::media::MediaKind;

/// Used when the user has no first name
pub const DEFAULT_USER_NAME: &str = "Foydalanuvchi";

pub const CHOOSE_EFFECT: &str = "🎨 Effektni tanlang:";
pub const PROCESSING: &str = "⏳ Ishlov berilmoqda...";
pub const ERROR: &str = "❌ Xatolik yuz berdi. Iltimos, qayta urinib ko'ring.";
pub const UNSUPPORTED: &str = "❌ Qo'llab-quvvatlanmaydigan fayl turi. Faqat video yoki rasm yuboring.";
pub const CANCEL_BUTTON: &str = "✖️ Bekor qilish";
pub const CANCELLED: &str = "🚫 Bekor qilindi. Yangi video yoki rasm yuboring.";
pub const NOTHING_TO_CANCEL: &str = "ℹ️ Bekor qilinadigan fayl yo'q.";
pub const NO_ACTIVE_SESSION: &str = "⌛ Fayl topilmadi yoki muddati o'tgan. Video yoki rasmni qayta yuboring.";
pub const HISTORY_EMPTY: &str = "📭 Hali birorta ham doira yaratmagansiz.";

pub const HIDE_INFO: &str = indoc! {"
    ❓ Muallifni yashirish:

    Telegram'da kruzhok (doiraviy video) yuborayotganda muallif nomi ko'rinadi.
    Uni yashirish uchun:

    1. Videoni tayyor kruzhok sifatida saqlang
    2. Uni boshqa suhbatga yo'naltiring
    3. Yoki botdan olingan kruzhokni to'g'ridan-to'g'ri ulashing

    Eslatma: Bu Telegram'ning xususiyati bo'lib, bot orqali to'liq nazorat qilib bo'lmaydi."};

pub const LANG_SELECTION: &str = indoc! {"
    🌐 Til tanlash:

    Hozirda qo'llab-quvvatlanadigan tillar:
    🇺🇿 O'zbek tili (joriy)
    🇷🇺 Rus tili (tez orada)
    🇺🇸 Ingliz tili (tez orada)

    Til o'zgartirish funksiyasi ishlab chiqilmoqda..."};

/// Greeting for /start and plain text messages
pub fn welcome(first_name: Option<&str>) -> String {
    let name = first_name.filter(|n| !n.trim().is_empty()).unwrap_or(DEFAULT_USER_NAME);
    formatdoc! {"
        👋 Salom, {name}!
        ① Video yoki rasm yuboring.
        ② Effektni tanlang.
        ③ Doira tayyor ✔️

        Tezkor buyruqlar:
        ♻️ Botni qayta ishga tushirish: /start
        ❓ Muallifni yashirish: /hide
        🌐 Tilni o'zgartirish: /lang",
        name = name,
    }
}

/// /history reply: total count and the latest entries
pub fn history(total: i64, entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return HISTORY_EMPTY.to_string();
    }

    let mut text = format!("📜 Sizning doiralaringiz (jami: {}):\n", total);
    for (i, entry) in entries.iter().enumerate() {
        let icon = MediaKind::from_str(&entry.original_media_type)
            .unwrap_or(MediaKind::Video)
            .icon();
        text.push_str(&format!(
            "\n{}. {} {} ({})",
            i + 1,
            icon,
            entry.effect_name,
            short_timestamp(&entry.created_at)
        ));
    }
    text
}

/// "YYYY-MM-DD HH:MM" part of a stored timestamp
fn short_timestamp(raw: &str) -> &str {
    raw.get(..16).unwrap_or(raw)
}
