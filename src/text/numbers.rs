//! Number expansion into words
//!
//! Cardinals for English, Spanish, Chinese and Sino-Korean. Digit strings too
//! long for `u64` are read digit by digit.

const EN_ONES: [&str; 20] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
    "nineteen",
];
const EN_TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];
const EN_SCALES: [(u64, &str); 6] = [
    (1_000_000_000_000_000_000, "quintillion"),
    (1_000_000_000_000_000, "quadrillion"),
    (1_000_000_000_000, "trillion"),
    (1_000_000_000, "billion"),
    (1_000_000, "million"),
    (1_000, "thousand"),
];

fn english_below_thousand(n: u64, out: &mut Vec<String>) {
    let hundreds = n / 100;
    let rest = n % 100;
    if hundreds > 0 {
        out.push(EN_ONES[hundreds as usize].to_string());
        out.push("hundred".to_string());
    }
    if rest == 0 {
        return;
    }
    if rest < 20 {
        out.push(EN_ONES[rest as usize].to_string());
    } else {
        out.push(EN_TENS[(rest / 10) as usize].to_string());
        if rest % 10 > 0 {
            out.push(EN_ONES[(rest % 10) as usize].to_string());
        }
    }
}

/// English cardinal (`1234` → `one thousand two hundred thirty four`)
pub fn english_cardinal(n: u64) -> String {
    if n == 0 {
        return EN_ONES[0].to_string();
    }
    let mut words = Vec::new();
    let mut rest = n;
    for (scale, name) in EN_SCALES {
        if rest >= scale {
            english_below_thousand(rest / scale, &mut words);
            words.push(name.to_string());
            rest %= scale;
        }
    }
    english_below_thousand(rest, &mut words);
    words.join(" ")
}

/// English ordinal (`21` → `twenty first`)
pub fn english_ordinal(n: u64) -> String {
    let cardinal = english_cardinal(n);
    let (head, last) = match cardinal.rsplit_once(' ') {
        Some((head, last)) => (format!("{head} "), last.to_string()),
        None => (String::new(), cardinal.clone()),
    };
    let last = match last.as_str() {
        "one" => "first".to_string(),
        "two" => "second".to_string(),
        "three" => "third".to_string(),
        "five" => "fifth".to_string(),
        "eight" => "eighth".to_string(),
        "nine" => "ninth".to_string(),
        "twelve" => "twelfth".to_string(),
        word if word.ends_with('y') => format!("{}ieth", &word[..word.len() - 1]),
        word => format!("{word}th"),
    };
    format!("{head}{last}")
}

const ES_UNITS: [&str; 30] = [
    "cero", "uno", "dos", "tres", "cuatro", "cinco", "seis", "siete", "ocho", "nueve", "diez",
    "once", "doce", "trece", "catorce", "quince", "dieciséis", "diecisiete", "dieciocho",
    "diecinueve", "veinte", "veintiuno", "veintidós", "veintitrés", "veinticuatro",
    "veinticinco", "veintiséis", "veintisiete", "veintiocho", "veintinueve",
];
const ES_TENS: [&str; 10] = [
    "", "", "", "treinta", "cuarenta", "cincuenta", "sesenta", "setenta", "ochenta", "noventa",
];
const ES_HUNDREDS: [&str; 10] = [
    "", "ciento", "doscientos", "trescientos", "cuatrocientos", "quinientos", "seiscientos",
    "setecientos", "ochocientos", "novecientos",
];

fn spanish_below_thousand(n: u64) -> String {
    if n == 100 {
        return "cien".to_string();
    }
    let mut parts = Vec::new();
    let hundreds = (n / 100) as usize;
    let rest = (n % 100) as usize;
    if hundreds > 0 {
        parts.push(ES_HUNDREDS[hundreds].to_string());
    }
    if rest > 0 {
        if rest < 30 {
            parts.push(ES_UNITS[rest].to_string());
        } else if rest % 10 == 0 {
            parts.push(ES_TENS[rest / 10].to_string());
        } else {
            parts.push(format!("{} y {}", ES_TENS[rest / 10], ES_UNITS[rest % 10]));
        }
    }
    parts.join(" ")
}

/// Drop the final vowel of "uno" before a noun (`veintiuno mil` → `veintiún mil`)
fn spanish_apocope(words: String) -> String {
    if let Some(stem) = words.strip_suffix("veintiuno") {
        format!("{stem}veintiún")
    } else if let Some(stem) = words.strip_suffix("uno") {
        format!("{stem}un")
    } else {
        words
    }
}

/// Spanish cardinal (`1995` → `mil novecientos noventa y cinco`)
pub fn spanish_cardinal(n: u64) -> String {
    if n == 0 {
        return ES_UNITS[0].to_string();
    }
    let millions = n / 1_000_000;
    let thousands = (n / 1_000) % 1_000;
    let rest = n % 1_000;

    let mut parts = Vec::new();
    if millions == 1 {
        parts.push("un millón".to_string());
    } else if millions > 1 {
        parts.push(format!("{} millones", spanish_apocope(spanish_cardinal(millions))));
    }
    if thousands == 1 {
        parts.push("mil".to_string());
    } else if thousands > 1 {
        parts.push(format!("{} mil", spanish_apocope(spanish_below_thousand(thousands))));
    }
    if rest > 0 {
        parts.push(spanish_below_thousand(rest));
    }
    parts.join(" ")
}

const ZH_DIGITS: [char; 10] = ['零', '一', '二', '三', '四', '五', '六', '七', '八', '九'];

fn chinese_group(n: u64) -> String {
    let digits = [n / 1000, (n / 100) % 10, (n / 10) % 10, n % 10];
    let units = ["千", "百", "十", ""];
    let mut out = String::new();
    let mut pending_zero = false;
    for (digit, unit) in digits.iter().zip(units) {
        if *digit == 0 {
            pending_zero |= !out.is_empty();
            continue;
        }
        if pending_zero {
            out.push('零');
            pending_zero = false;
        }
        out.push(ZH_DIGITS[*digit as usize]);
        out.push_str(unit);
    }
    out
}

/// Chinese cardinal (`1005` → `一千零五`)
pub fn chinese_number(n: u64) -> String {
    if n == 0 {
        return ZH_DIGITS[0].to_string();
    }
    let groups = [
        (n / 100_000_000, "亿"),
        ((n / 10_000) % 10_000, "万"),
        (n % 10_000, ""),
    ];

    let mut out = String::new();
    let mut need_zero = false;
    for (group, unit) in groups {
        if group == 0 {
            need_zero |= !out.is_empty();
            continue;
        }
        if !out.is_empty() && (need_zero || group < 1000) {
            out.push('零');
        }
        need_zero = false;
        if group >= 10_000 {
            out.push_str(&chinese_number(group));
        } else {
            out.push_str(&chinese_group(group));
        }
        out.push_str(unit);
    }

    match out.strip_prefix("一十") {
        Some(rest) => format!("十{rest}"),
        None => out,
    }
}

/// Chinese digit-by-digit reading (`2024` → `二零二四`)
pub fn chinese_digits(digits: &str) -> String {
    digits
        .chars()
        .filter_map(|c| c.to_digit(10))
        .map(|d| ZH_DIGITS[d as usize])
        .collect()
}

const KO_DIGITS: [&str; 10] = ["영", "일", "이", "삼", "사", "오", "육", "칠", "팔", "구"];

fn korean_group(n: u64) -> String {
    let digits = [n / 1000, (n / 100) % 10, (n / 10) % 10, n % 10];
    let units = ["천", "백", "십", ""];
    let mut out = String::new();
    for (digit, unit) in digits.iter().zip(units) {
        match *digit {
            0 => {}
            1 if !unit.is_empty() => out.push_str(unit),
            d => {
                out.push_str(KO_DIGITS[d as usize]);
                out.push_str(unit);
            }
        }
    }
    out
}

/// Sino-Korean cardinal (`15000` → `만오천`)
///
/// Read in myriad tiers (조, 억, 만); values past 9999조 read the leading
/// tier recursively.
pub fn korean_number(n: u64) -> String {
    if n == 0 {
        return KO_DIGITS[0].to_string();
    }
    const MYRIAD: u64 = 10_000;
    let jo = n / 1_000_000_000_000;
    let tiers = [
        ((n / 100_000_000) % MYRIAD, '억'),
        ((n / MYRIAD) % MYRIAD, '만'),
    ];

    let mut out = String::new();
    if jo >= MYRIAD {
        out.push_str(&korean_number(jo));
        out.push('조');
    } else if jo > 0 {
        out.push_str(&korean_tier(jo, '조'));
        out.push('조');
    }
    for (value, unit) in tiers {
        if value > 0 {
            out.push_str(&korean_tier(value, unit));
            out.push(unit);
        }
    }
    out.push_str(&korean_group(n % MYRIAD));
    out
}

/// Count in front of a myriad unit; a bare one is read before 억 and 조 but not 만
fn korean_tier(value: u64, unit: char) -> String {
    match (value, unit) {
        (1, '만') => String::new(),
        _ => korean_group(value),
    }
}

/// Read a digit string with `cardinal`, falling back to per-digit reading on overflow
pub fn read_integer(digits: &str, cardinal: fn(u64) -> String, separator: &str) -> String {
    match digits.parse::<u64>() {
        Ok(n) => cardinal(n),
        Err(_) => digits
            .chars()
            .filter_map(|c| c.to_digit(10))
            .map(|d| cardinal(d as u64))
            .collect::<Vec<_>>()
            .join(separator),
    }
}
