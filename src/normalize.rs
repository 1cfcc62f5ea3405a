//! File name normalization.
//!
//! Transliterates Cyrillic (Russian and Ukrainian) letters to Latin and
//! replaces characters that are awkward in file names with underscores.
//! Anything not in the table passes through untouched.

/// Lowercase Cyrillic letters and their Latin transliteration.
///
/// Uppercase letters are handled by lowercasing, looking up here, then
/// uppercasing the result.
const CYRILLIC: &[(char, &str)] = &[
    ('а', "a"),
    ('б', "b"),
    ('в', "v"),
    ('г', "g"),
    ('д', "d"),
    ('е', "e"),
    ('ё', "e"),
    ('ж', "j"),
    ('з', "z"),
    ('и', "i"),
    ('й', "j"),
    ('к', "k"),
    ('л', "l"),
    ('м', "m"),
    ('н', "n"),
    ('о', "o"),
    ('п', "p"),
    ('р', "r"),
    ('с', "s"),
    ('т', "t"),
    ('у', "u"),
    ('ф', "f"),
    ('х', "h"),
    ('ц', "ts"),
    ('ч', "ch"),
    ('ш', "sh"),
    ('щ', "sch"),
    ('ъ', ""),
    ('ы', "y"),
    ('ь', ""),
    ('э', "e"),
    ('ю', "yu"),
    ('я', "ya"),
    ('є', "je"),
    ('і', "i"),
    ('ї', "ji"),
    ('ґ', "g"),
];

/// Characters replaced by an underscore.
const UNSAFE: &[char] = &[' ', 'ʼ', '\'', '"', '@'];

fn transliterate(c: char) -> Option<&'static str> {
    CYRILLIC
        .iter()
        .find(|(cyr, _)| *cyr == c)
        .map(|(_, latin)| *latin)
}

/// Normalizes a file stem into a filesystem-friendly ASCII-leaning name.
///
/// Idempotent: the output contains no character the table maps.
///
/// ```
/// use sortdir::normalize::normalize;
///
/// assert_eq!(normalize("архив"), "arhiv");
/// assert_eq!(normalize("Щука і я"), "SCHuka_i_ya");
/// assert_eq!(normalize("plain_name"), "plain_name");
/// ```
pub fn normalize(stem: &str) -> String {
    let mut out = String::with_capacity(stem.len());
    for c in stem.chars() {
        if UNSAFE.contains(&c) {
            out.push('_');
        } else if let Some(latin) = transliterate(c) {
            out.push_str(latin);
        } else if let Some(latin) = c.to_lowercase().next().and_then(transliterate) {
            out.push_str(&latin.to_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transliterates_lowercase() {
        assert_eq!(normalize("привет"), "privet");
        assert_eq!(normalize("щётка"), "schetka");
        assert_eq!(normalize("їжак"), "jijak");
    }

    #[test]
    fn test_transliterates_uppercase() {
        assert_eq!(normalize("Архив"), "Arhiv");
        assert_eq!(normalize("ЦЕХ"), "TSEH");
        assert_eq!(normalize("Є"), "JE");
    }

    #[test]
    fn test_drops_hard_and_soft_signs() {
        assert_eq!(normalize("объём"), "obem");
        assert_eq!(normalize("соль"), "sol");
    }

    #[test]
    fn test_replaces_unsafe_characters() {
        assert_eq!(normalize("my file"), "my_file");
        assert_eq!(normalize("it's \"quoted\"@home"), "it_s__quoted__home");
        assert_eq!(normalize("мʼята"), "m_yata");
    }

    #[test]
    fn test_passes_through_other_characters() {
        assert_eq!(normalize("report-2024_v2"), "report-2024_v2");
        assert_eq!(normalize("日本"), "日本");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "архив",
            "Щука і я",
            "it's @ home",
            "Mixed Кириллица and Latin",
            "ЁЖИК в тумане",
            "already_clean",
            "日本 語",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {sample:?}");
        }
    }
}
