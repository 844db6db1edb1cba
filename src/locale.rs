//! WordPress locale resolution.
//!
//! Maps a WordPress locale code (`pt_PT`, `de_DE_formal`, ...) to the metadata
//! the translation service needs: the GlotPress slug and variant used in export
//! URLs, the Rosetta subdomain, and the plural forms written into compiled files.

use serde::Serialize;

use crate::error::{Result, UpdateError};

const DEFAULT_VARIANT: &str = "default";

/// One row of the GlotPress locale table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpLocale {
    pub english_name: &'static str,
    pub native_name: &'static str,
    pub lang_code_iso_639_1: &'static str,
    pub wp_locale: &'static str,
    pub slug: &'static str,
    pub variant: Option<&'static str>,
    pub wporg_subdomain: Option<&'static str>,
    pub nplurals: u32,
    pub plural_expression: &'static str,
}

macro_rules! gp_locale {
    ($english:expr, $native:expr, $iso:expr, $wp:expr, $slug:expr, $variant:expr, $sub:expr, $n:expr, $expr:expr) => {
        GpLocale {
            english_name: $english,
            native_name: $native,
            lang_code_iso_639_1: $iso,
            wp_locale: $wp,
            slug: $slug,
            variant: $variant,
            wporg_subdomain: $sub,
            nplurals: $n,
            plural_expression: $expr,
        }
    };
}

const N_NOT_ONE: &str = "n != 1";
const N_GT_ONE: &str = "n > 1";
const NONE: &str = "0";
const ARABIC: &str = "(n == 0) ? 0 : ((n == 1) ? 1 : ((n == 2) ? 2 : ((n % 100 >= 3 && n % 100 <= 10) ? 3 : ((n % 100 >= 11 && n % 100 <= 99) ? 4 : 5))))";
const EAST_SLAVIC: &str = "(n % 10 == 1 && n % 100 != 11) ? 0 : ((n % 10 >= 2 && n % 10 <= 4 && (n % 100 < 12 || n % 100 > 14)) ? 1 : 2)";
const CZECH: &str = "(n == 1) ? 0 : ((n >= 2 && n <= 4) ? 1 : 2)";
const SORBIAN: &str = "(n % 100 == 1) ? 0 : ((n % 100 == 2) ? 1 : ((n % 100 == 3 || n % 100 == 4) ? 2 : 3))";
const ONE_UNLESS_ELEVEN: &str = "n % 10 != 1 || n % 100 == 11";

static GP_LOCALES: &[GpLocale] = &[
    gp_locale!("Afrikaans", "Afrikaans", "af", "af", "af", None, None, 2, N_NOT_ONE),
    gp_locale!("Amharic", "አማርኛ", "am", "am", "am", None, None, 2, N_GT_ONE),
    gp_locale!("Aragonese", "Aragonés", "an", "arg", "an", None, None, 2, N_NOT_ONE),
    gp_locale!("Arabic", "العربية", "ar", "ar", "ar", None, None, 6, ARABIC),
    gp_locale!("Moroccan Arabic", "العربية المغربية", "ar", "ary", "ary", None, None, 6, ARABIC),
    gp_locale!("Emoji", "🌈✨", "", "art_xemoji", "art-xemoji", None, None, 2, N_NOT_ONE),
    gp_locale!("Assamese", "অসমীয়া", "as", "as", "as", None, None, 2, N_NOT_ONE),
    gp_locale!("Asturian", "Asturianu", "ast", "ast", "ast", None, None, 2, N_NOT_ONE),
    gp_locale!("Azerbaijani", "Azərbaycan dili", "az", "az", "az", None, None, 2, N_NOT_ONE),
    gp_locale!("South Azerbaijani", "گؤنئی آذربایجان", "az", "azb", "azb", None, None, 2, N_NOT_ONE),
    gp_locale!("Catalan (Balear)", "Català (Balear)", "ca", "bal", "bal", None, None, 2, N_NOT_ONE),
    gp_locale!("Belarusian", "Беларуская мова", "be", "bel", "bel", None, None, 3, EAST_SLAVIC),
    gp_locale!("Bulgarian", "Български", "bg", "bg_BG", "bg", None, None, 2, N_NOT_ONE),
    gp_locale!("Bengali (Bangladesh)", "বাংলা", "bn", "bn_BD", "bn", None, None, 2, N_NOT_ONE),
    gp_locale!("Tibetan", "བོད་ཡིག", "bo", "bo", "bo", None, None, 1, NONE),
    gp_locale!("Breton", "Brezhoneg", "br", "br_FR", "br", None, None, 2, N_GT_ONE),
    gp_locale!("Bosnian", "Bosanski", "bs", "bs_BA", "bs", None, None, 3, EAST_SLAVIC),
    gp_locale!("Catalan", "Català", "ca", "ca", "ca", None, None, 2, N_NOT_ONE),
    gp_locale!("Cebuano", "Cebuano", "", "ceb", "ceb", None, None, 2, N_NOT_ONE),
    gp_locale!("Kurdish (Sorani)", "كوردی‎", "ku", "ckb", "ckb", None, None, 2, N_NOT_ONE),
    gp_locale!("Corsican", "Corsu", "co", "co", "co", None, None, 2, N_NOT_ONE),
    gp_locale!("Czech", "Čeština", "cs", "cs_CZ", "cs", None, None, 3, CZECH),
    gp_locale!("Welsh", "Cymraeg", "cy", "cy", "cy", None, None, 4,
        "(n == 1) ? 0 : ((n == 2) ? 1 : ((n != 8 && n != 11) ? 2 : 3))"),
    gp_locale!("Danish", "Dansk", "da", "da_DK", "da", None, Some("dk"), 2, N_NOT_ONE),
    gp_locale!("German (Austria)", "Deutsch (Österreich)", "de", "de_AT", "de-at", None, None, 2, N_NOT_ONE),
    gp_locale!("German (Switzerland)", "Deutsch (Schweiz)", "de", "de_CH", "de-ch", None, None, 2, N_NOT_ONE),
    gp_locale!("German (Switzerland, Informal)", "Deutsch (Schweiz, Du)", "de", "de_CH_informal", "de-ch", Some("informal"), None, 2, N_NOT_ONE),
    gp_locale!("German", "Deutsch", "de", "de_DE", "de", None, None, 2, N_NOT_ONE),
    gp_locale!("German (Formal)", "Deutsch (Sie)", "de", "de_DE_formal", "de", Some("formal"), None, 2, N_NOT_ONE),
    gp_locale!("Lower Sorbian", "Dolnoserbšćina", "", "dsb", "dsb", None, None, 4, SORBIAN),
    gp_locale!("Dzongkha", "རྫོང་ཁ", "dz", "dzo", "dzo", None, None, 1, NONE),
    gp_locale!("Greek", "Ελληνικά", "el", "el", "el", None, None, 2, N_NOT_ONE),
    gp_locale!("English (Australia)", "English (Australia)", "en", "en_AU", "en-au", None, None, 2, N_NOT_ONE),
    gp_locale!("English (Canada)", "English (Canada)", "en", "en_CA", "en-ca", None, None, 2, N_NOT_ONE),
    gp_locale!("English (UK)", "English (UK)", "en", "en_GB", "en-gb", None, None, 2, N_NOT_ONE),
    gp_locale!("English (New Zealand)", "English (New Zealand)", "en", "en_NZ", "en-nz", None, None, 2, N_NOT_ONE),
    gp_locale!("English (South Africa)", "English (South Africa)", "en", "en_ZA", "en-za", None, None, 2, N_NOT_ONE),
    gp_locale!("Esperanto", "Esperanto", "eo", "eo", "eo", None, None, 2, N_NOT_ONE),
    gp_locale!("Spanish (Argentina)", "Español de Argentina", "es", "es_AR", "es-ar", None, None, 2, N_NOT_ONE),
    gp_locale!("Spanish (Chile)", "Español de Chile", "es", "es_CL", "es-cl", None, None, 2, N_NOT_ONE),
    gp_locale!("Spanish (Colombia)", "Español de Colombia", "es", "es_CO", "es-co", None, None, 2, N_NOT_ONE),
    gp_locale!("Spanish (Costa Rica)", "Español de Costa Rica", "es", "es_CR", "es-cr", None, None, 2, N_NOT_ONE),
    gp_locale!("Spanish (Dominican Republic)", "Español de República Dominicana", "es", "es_DO", "es-do", None, None, 2, N_NOT_ONE),
    gp_locale!("Spanish (Ecuador)", "Español de Ecuador", "es", "es_EC", "es-ec", None, None, 2, N_NOT_ONE),
    gp_locale!("Spanish (Spain)", "Español", "es", "es_ES", "es", None, None, 2, N_NOT_ONE),
    gp_locale!("Spanish (Guatemala)", "Español de Guatemala", "es", "es_GT", "es-gt", None, None, 2, N_NOT_ONE),
    gp_locale!("Spanish (Mexico)", "Español de México", "es", "es_MX", "es-mx", None, None, 2, N_NOT_ONE),
    gp_locale!("Spanish (Peru)", "Español de Perú", "es", "es_PE", "es-pe", None, None, 2, N_NOT_ONE),
    gp_locale!("Spanish (Puerto Rico)", "Español de Puerto Rico", "es", "es_PR", "es-pr", None, None, 2, N_NOT_ONE),
    gp_locale!("Spanish (Uruguay)", "Español de Uruguay", "es", "es_UY", "es-uy", None, None, 2, N_NOT_ONE),
    gp_locale!("Spanish (Venezuela)", "Español de Venezuela", "es", "es_VE", "es-ve", None, None, 2, N_NOT_ONE),
    gp_locale!("Estonian", "Eesti", "et", "et", "et", None, None, 2, N_NOT_ONE),
    gp_locale!("Basque", "Euskara", "eu", "eu", "eu", None, None, 2, N_NOT_ONE),
    gp_locale!("Persian (Afghanistan)", "(فارسی (افغانستان", "fa", "fa_AF", "fa-af", None, None, 2, N_GT_ONE),
    gp_locale!("Persian", "فارسی", "fa", "fa_IR", "fa", None, None, 2, N_GT_ONE),
    gp_locale!("Finnish", "Suomi", "fi", "fi", "fi", None, None, 2, N_NOT_ONE),
    gp_locale!("Faroese", "Føroyskt", "fo", "fo", "fo", None, None, 2, N_NOT_ONE),
    gp_locale!("French (Belgium)", "Français de Belgique", "fr", "fr_BE", "fr-be", None, None, 2, N_GT_ONE),
    gp_locale!("French (Canada)", "Français du Canada", "fr", "fr_CA", "fr-ca", None, None, 2, N_GT_ONE),
    gp_locale!("French (France)", "Français", "fr", "fr_FR", "fr", None, None, 2, N_GT_ONE),
    gp_locale!("Friulian", "Friulian", "fur", "fur", "fur", None, None, 2, N_NOT_ONE),
    gp_locale!("Frisian", "Frysk", "fy", "fy", "fy", None, None, 2, N_NOT_ONE),
    gp_locale!("Irish", "Gaelige", "ga", "ga", "ga", None, None, 5,
        "(n == 1) ? 0 : ((n == 2) ? 1 : ((n < 7) ? 2 : ((n < 11) ? 3 : 4)))"),
    gp_locale!("Scottish Gaelic", "Gàidhlig", "gd", "gd", "gd", None, None, 4,
        "(n == 1 || n == 11) ? 0 : ((n == 2 || n == 12) ? 1 : ((n > 2 && n < 20) ? 2 : 3))"),
    gp_locale!("Galician", "Galego", "gl", "gl_ES", "gl", None, None, 2, N_NOT_ONE),
    gp_locale!("Gujarati", "ગુજરાતી", "gu", "gu", "gu", None, None, 2, N_NOT_ONE),
    gp_locale!("Haitian Creole", "Kreyòl ayisyen", "ht", "hat", "hat", None, None, 2, N_NOT_ONE),
    gp_locale!("Hazaragi", "هزاره گی", "", "haz", "haz", None, None, 2, N_NOT_ONE),
    gp_locale!("Hebrew", "עִבְרִית", "he", "he_IL", "he", None, None, 2, N_NOT_ONE),
    gp_locale!("Hindi", "हिन्दी", "hi", "hi_IN", "hi", None, None, 2, N_NOT_ONE),
    gp_locale!("Croatian", "Hrvatski", "hr", "hr", "hr", None, None, 3, EAST_SLAVIC),
    gp_locale!("Upper Sorbian", "Hornjoserbšćina", "", "hsb", "hsb", None, None, 4, SORBIAN),
    gp_locale!("Hungarian", "Magyar", "hu", "hu_HU", "hu", None, None, 2, N_NOT_ONE),
    gp_locale!("Armenian", "Հայերեն", "hy", "hy", "hy", None, None, 2, N_NOT_ONE),
    gp_locale!("Indonesian", "Bahasa Indonesia", "id", "id_ID", "id", None, None, 2, N_GT_ONE),
    gp_locale!("Icelandic", "Íslenska", "is", "is_IS", "is", None, None, 2, ONE_UNLESS_ELEVEN),
    gp_locale!("Italian", "Italiano", "it", "it_IT", "it", None, None, 2, N_NOT_ONE),
    gp_locale!("Japanese", "日本語", "ja", "ja", "ja", None, None, 1, NONE),
    gp_locale!("Javanese", "Basa Jawa", "jv", "jv_ID", "jv", None, None, 2, N_NOT_ONE),
    gp_locale!("Georgian", "ქართული", "ka", "ka_GE", "ka", None, None, 1, NONE),
    gp_locale!("Kabyle", "Taqbaylit", "kab", "kab", "kab", None, None, 2, N_GT_ONE),
    gp_locale!("Kinyarwanda", "Ikinyarwanda", "rw", "kin", "kin", None, None, 2, N_NOT_ONE),
    gp_locale!("Kazakh", "Қазақ тілі", "kk", "kk", "kk", None, None, 2, N_NOT_ONE),
    gp_locale!("Khmer", "ភាសាខ្មែរ", "km", "km", "km", None, None, 1, NONE),
    gp_locale!("Kannada", "ಕನ್ನಡ", "kn", "kn", "kn", None, None, 2, N_NOT_ONE),
    gp_locale!("Korean", "한국어", "ko", "ko_KR", "ko", None, None, 1, NONE),
    gp_locale!("Kirghiz", "Кыргызча", "ky", "ky_KY", "ky", None, None, 1, NONE),
    gp_locale!("Luxembourgish", "Lëtzebuergesch", "lb", "lb_LU", "lb", None, None, 2, N_NOT_ONE),
    gp_locale!("Limburgish", "Limburgs", "li", "li", "li", None, None, 2, N_NOT_ONE),
    gp_locale!("Lao", "ພາສາລາວ", "lo", "lo", "lo", None, None, 1, NONE),
    gp_locale!("Lithuanian", "Lietuvių kalba", "lt", "lt_LT", "lt", None, None, 3,
        "(n % 10 == 1 && (n % 100 < 11 || n % 100 > 19)) ? 0 : ((n % 10 >= 2 && n % 10 <= 9 && (n % 100 < 11 || n % 100 > 19)) ? 1 : 2)"),
    gp_locale!("Latvian", "Latviešu valoda", "lv", "lv", "lv", None, None, 3,
        "(n % 10 == 1 && n % 100 != 11) ? 0 : ((n != 0) ? 1 : 2)"),
    gp_locale!("Malagasy", "Malagasy", "mg", "mg_MG", "mg", None, None, 2, N_GT_ONE),
    gp_locale!("Macedonian", "Македонски јазик", "mk", "mk_MK", "mk", None, None, 2, ONE_UNLESS_ELEVEN),
    gp_locale!("Malayalam", "മലയാളം", "ml", "ml_IN", "ml", None, None, 2, N_NOT_ONE),
    gp_locale!("Maltese", "Malti", "mt", "mlt", "mlt", None, None, 4,
        "(n == 1) ? 0 : ((n == 0 || (n % 100 >= 2 && n % 100 <= 10)) ? 1 : ((n % 100 > 10 && n % 100 < 20) ? 2 : 3))"),
    gp_locale!("Mongolian", "Монгол", "mn", "mn", "mn", None, None, 2, N_NOT_ONE),
    gp_locale!("Marathi", "मराठी", "mr", "mr", "mr", None, None, 2, N_NOT_ONE),
    gp_locale!("Malay", "Bahasa Melayu", "ms", "ms_MY", "ms", None, None, 1, NONE),
    gp_locale!("Myanmar (Burmese)", "ဗမာစာ", "my", "my_MM", "mya", None, None, 2, N_NOT_ONE),
    gp_locale!("Norwegian (Bokmål)", "Norsk bokmål", "nb", "nb_NO", "nb", None, None, 2, N_NOT_ONE),
    gp_locale!("Nepali", "नेपाली", "ne", "ne_NP", "ne", None, None, 2, N_NOT_ONE),
    gp_locale!("Dutch (Belgium)", "Nederlands (België)", "nl", "nl_BE", "nl-be", None, None, 2, N_NOT_ONE),
    gp_locale!("Dutch", "Nederlands", "nl", "nl_NL", "nl", None, None, 2, N_NOT_ONE),
    gp_locale!("Dutch (Formal)", "Nederlands (Formeel)", "nl", "nl_NL_formal", "nl", Some("formal"), None, 2, N_NOT_ONE),
    gp_locale!("Norwegian (Nynorsk)", "Norsk nynorsk", "nn", "nn_NO", "nn", None, None, 2, N_NOT_ONE),
    gp_locale!("Occitan", "Occitan", "oc", "oci", "oci", None, None, 2, N_GT_ONE),
    gp_locale!("Oriya", "ଓଡ଼ିଆ", "or", "ory", "ory", None, None, 2, N_NOT_ONE),
    gp_locale!("Punjabi", "ਪੰਜਾਬੀ", "pa", "pa_IN", "pa", None, None, 2, N_NOT_ONE),
    gp_locale!("Polish", "Polski", "pl", "pl_PL", "pl", None, None, 3,
        "(n == 1) ? 0 : ((n % 10 >= 2 && n % 10 <= 4 && (n % 100 < 12 || n % 100 > 14)) ? 1 : 2)"),
    gp_locale!("Pashto", "پښتو", "ps", "ps", "ps", None, None, 2, N_NOT_ONE),
    gp_locale!("Portuguese (Angola)", "Português de Angola", "pt", "pt_AO", "pt-ao", None, None, 2, N_NOT_ONE),
    gp_locale!("Portuguese (Brazil)", "Português do Brasil", "pt", "pt_BR", "pt-br", None, Some("br"), 2, N_GT_ONE),
    gp_locale!("Portuguese (Portugal)", "Português", "pt", "pt_PT", "pt", None, None, 2, N_NOT_ONE),
    gp_locale!("Portuguese (Portugal, AO90)", "Português (AO90)", "pt", "pt_PT_ao90", "pt", Some("ao90"), None, 2, N_NOT_ONE),
    gp_locale!("Rohingya", "Ruáinga", "", "rhg", "rhg", None, None, 1, NONE),
    gp_locale!("Romanian", "Română", "ro", "ro_RO", "ro", None, None, 3,
        "(n == 1) ? 0 : ((n == 0 || n % 100 >= 2 && n % 100 <= 19) ? 1 : 2)"),
    gp_locale!("Russian", "Русский", "ru", "ru_RU", "ru", None, None, 3, EAST_SLAVIC),
    gp_locale!("Sakha", "Сахалыы", "sah", "sah", "sah", None, None, 2, N_NOT_ONE),
    gp_locale!("Sindhi", "سنڌي", "sd", "snd", "snd", None, None, 2, N_NOT_ONE),
    gp_locale!("Sinhala", "සිංහල", "si", "si_LK", "si", None, None, 2, N_NOT_ONE),
    gp_locale!("Slovak", "Slovenčina", "sk", "sk_SK", "sk", None, None, 3, CZECH),
    gp_locale!("Saraiki", "سرائیکی", "", "skr", "skr", None, None, 2, N_NOT_ONE),
    gp_locale!("Slovenian", "Slovenščina", "sl", "sl_SI", "sl", None, None, 4, SORBIAN),
    gp_locale!("Somali", "Afsoomaali", "so", "so_SO", "so", None, None, 2, N_NOT_ONE),
    gp_locale!("Albanian", "Shqip", "sq", "sq", "sq", None, None, 2, N_NOT_ONE),
    gp_locale!("Serbian", "Српски језик", "sr", "sr_RS", "sr", None, None, 3, EAST_SLAVIC),
    gp_locale!("Swedish", "Svenska", "sv", "sv_SE", "sv", None, None, 2, N_NOT_ONE),
    gp_locale!("Swahili", "Kiswahili", "sw", "sw", "sw", None, None, 2, N_NOT_ONE),
    gp_locale!("Silesian", "Ślōnskŏ gŏdka", "", "szl", "szl", None, None, 3,
        "(n == 1) ? 0 : ((n % 10 >= 2 && n % 10 <= 4 && (n % 100 < 10 || n % 100 >= 20)) ? 1 : 2)"),
    gp_locale!("Tamil", "தமிழ்", "ta", "ta_IN", "ta", None, None, 2, N_NOT_ONE),
    gp_locale!("Tamil (Sri Lanka)", "தமிழ்", "ta", "ta_LK", "ta-lk", None, None, 2, N_NOT_ONE),
    gp_locale!("Tahitian", "Reo Tahiti", "ty", "tah", "tah", None, None, 2, N_GT_ONE),
    gp_locale!("Telugu", "తెలుగు", "te", "te", "te", None, None, 2, N_NOT_ONE),
    gp_locale!("Thai", "ไทย", "th", "th", "th", None, None, 1, NONE),
    gp_locale!("Tagalog", "Tagalog", "tl", "tl", "tl", None, None, 2, N_NOT_ONE),
    gp_locale!("Turkish", "Türkçe", "tr", "tr_TR", "tr", None, None, 2, N_GT_ONE),
    gp_locale!("Tatar", "Татар теле", "tt", "tt_RU", "tt", None, None, 1, NONE),
    gp_locale!("Uighur", "ئۇيغۇرچە", "ug", "ug_CN", "ug", None, None, 2, N_NOT_ONE),
    gp_locale!("Ukrainian", "Українська", "uk", "uk", "uk", None, None, 3, EAST_SLAVIC),
    gp_locale!("Urdu", "اردو", "ur", "ur", "ur", None, None, 2, N_NOT_ONE),
    gp_locale!("Uzbek", "O‘zbekcha", "uz", "uz_UZ", "uz", None, None, 1, NONE),
    gp_locale!("Vietnamese", "Tiếng Việt", "vi", "vi", "vi", None, None, 1, NONE),
    gp_locale!("Yoruba", "èdè Yorùbá", "yo", "yor", "yor", None, None, 2, N_NOT_ONE),
    gp_locale!("Chinese (China)", "简体中文", "zh", "zh_CN", "zh-cn", None, Some("cn"), 1, NONE),
    gp_locale!("Chinese (Hong Kong)", "香港中文", "zh", "zh_HK", "zh-hk", None, Some("hk"), 1, NONE),
    gp_locale!("Chinese (Taiwan)", "繁體中文", "zh", "zh_TW", "zh-tw", None, Some("tw"), 1, NONE),
];

/// Locale metadata resolved for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Locale {
    pub wp_locale: String,
    pub english_name: String,
    pub native_name: String,
    pub lang_code_iso_639_1: String,
    pub slug: String,
    pub variant: String,
    /// `{slug}/{variant}`, the path segment used by export URLs.
    pub locale_slug: String,
    pub wporg_subdomain: String,
    pub nplurals: u32,
    pub plural_expression: String,
}

impl Locale {
    pub fn new(gp: &GpLocale) -> Self {
        let variant = gp.variant.unwrap_or(DEFAULT_VARIANT);
        Self {
            wp_locale: gp.wp_locale.to_string(),
            english_name: gp.english_name.to_string(),
            native_name: gp.native_name.to_string(),
            lang_code_iso_639_1: gp.lang_code_iso_639_1.to_string(),
            slug: gp.slug.to_string(),
            variant: variant.to_string(),
            locale_slug: format!("{}/{}", gp.slug, variant),
            wporg_subdomain: gp.wporg_subdomain.unwrap_or(gp.slug).to_string(),
            nplurals: gp.nplurals,
            plural_expression: gp.plural_expression.to_string(),
        }
    }

    /// Value of the gettext `Plural-Forms` header for this locale.
    pub fn plural_forms(&self) -> String {
        format!(
            "nplurals={}; plural={};",
            self.nplurals, self.plural_expression
        )
    }
}

/// Resolve a WordPress locale code.
pub fn resolve(wp_locale: &str) -> Result<Locale> {
    let code = wp_locale.trim();
    if !is_well_formed(code) {
        tracing::debug!(wp_locale = %wp_locale, "Malformed locale code");
        return Err(UpdateError::LocaleResolution(wp_locale.to_string()));
    }

    let gp = GP_LOCALES
        .iter()
        .find(|gp| gp.wp_locale == code)
        .ok_or_else(|| UpdateError::LocaleResolution(wp_locale.to_string()))?;

    let locale = Locale::new(gp);
    tracing::trace!(wp_locale = %locale.wp_locale, locale_slug = %locale.locale_slug, "Resolved locale");
    Ok(locale)
}

/// All known locales, in table order.
pub fn all() -> impl Iterator<Item = &'static GpLocale> {
    GP_LOCALES.iter()
}

/// Locales whose code or names contain `query` (case-insensitive).
pub fn search(query: &str) -> Vec<&'static GpLocale> {
    let needle = query.to_lowercase();
    GP_LOCALES
        .iter()
        .filter(|gp| {
            gp.wp_locale.to_lowercase().contains(&needle)
                || gp.english_name.to_lowercase().contains(&needle)
                || gp.native_name.to_lowercase().contains(&needle)
        })
        .collect()
}

fn is_well_formed(code: &str) -> bool {
    let mut parts = code.split('_');
    let lang_ok = parts
        .next()
        .is_some_and(|lang| (2..=3).contains(&lang.len()) && lang.chars().all(|c| c.is_ascii_lowercase()));
    lang_ok && parts.all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_portuguese() {
        let locale = resolve("pt_PT").unwrap();
        assert_eq!(locale.wp_locale, "pt_PT");
        assert_eq!(locale.locale_slug, "pt/default");
        assert_eq!(locale.wporg_subdomain, "pt");
        assert_eq!(locale.plural_forms(), "nplurals=2; plural=n != 1;");
    }

    #[test]
    fn formal_variant_is_part_of_locale_slug() {
        let locale = resolve("de_DE_formal").unwrap();
        assert_eq!(locale.locale_slug, "de/formal");
        assert_eq!(locale.wporg_subdomain, "de");
    }

    #[test]
    fn explicit_subdomain_wins_over_slug() {
        let locale = resolve("pt_BR").unwrap();
        assert_eq!(locale.locale_slug, "pt-br/default");
        assert_eq!(locale.wporg_subdomain, "br");
    }

    #[test]
    fn unknown_locale_is_an_error() {
        let err = resolve("xx_YY").unwrap_err();
        assert_eq!(err.kind(), "locale-resolution-error");
    }

    #[test]
    fn malformed_locale_is_an_error() {
        for code in ["", "  ", "pt-PT", "PT_pt", "pt__PT", "../pt_PT"] {
            assert!(resolve(code).is_err(), "{code:?} should not resolve");
        }
    }

    #[test]
    fn locale_codes_are_unique() {
        let mut codes: Vec<_> = all().map(|gp| gp.wp_locale).collect();
        let total = codes.len();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), total);
    }

    #[test]
    fn resolves_regional_and_variant_locales() {
        for (code, locale_slug) in [
            ("pt_PT_ao90", "pt/ao90"),
            ("es_AR", "es-ar/default"),
            ("bg_BG", "bg/default"),
            ("sk_SK", "sk/default"),
            ("hr", "hr/default"),
            ("th", "th/default"),
            ("fa_IR", "fa/default"),
            ("de_CH_informal", "de-ch/informal"),
            ("art_xemoji", "art-xemoji/default"),
        ] {
            let locale = resolve(code).unwrap_or_else(|e| panic!("{code}: {e}"));
            assert_eq!(locale.locale_slug, locale_slug, "{code}");
        }
    }

    #[test]
    fn slug_and_variant_pairs_are_unique() {
        let mut pairs: Vec<_> = all().map(|gp| (gp.slug, gp.variant)).collect();
        let total = pairs.len();
        pairs.sort_unstable();
        pairs.dedup();
        assert_eq!(pairs.len(), total);
        assert!(total > 140);
    }

    #[test]
    fn plural_counts_are_sane() {
        for gp in all() {
            assert!((1..=6).contains(&gp.nplurals), "{}", gp.wp_locale);
            assert_eq!(gp.nplurals == 1, gp.plural_expression == NONE, "{}", gp.wp_locale);
        }
    }

    #[test]
    fn search_matches_names() {
        let found = search("portug");
        assert!(found.iter().any(|gp| gp.wp_locale == "pt_PT"));
        assert!(found.iter().any(|gp| gp.wp_locale == "pt_BR"));
    }
}
