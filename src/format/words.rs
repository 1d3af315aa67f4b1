//! Amounts in Vietnamese words.

const DIGITS: [&str; 10] = [
    "không", "một", "hai", "ba", "bốn", "năm", "sáu", "bảy", "tám", "chín",
];

const GROUP_NAMES: [&str; 3] = ["", "nghìn", "triệu"];

/// Render an integer in Vietnamese words, first letter capitalised.
///
/// Groups of three digits are read with `nghìn`, `triệu` and `tỷ`; a
/// missing tens digit reads `lẻ` (`một trăm lẻ năm`), and inner groups keep
/// their `không trăm` (`một triệu không trăm năm mươi nghìn`).
pub fn to_vietnamese_words(number: i64) -> String {
    let words = if number < 0 {
        format!("âm {}", spell(number.unsigned_abs()))
    } else {
        spell(number as u64)
    };
    capitalize(&words)
}

fn spell(number: u64) -> String {
    if number == 0 {
        return DIGITS[0].to_string();
    }

    let mut groups = Vec::new();
    let mut rest = number;
    while rest > 0 {
        groups.push((rest % 1000) as usize);
        rest /= 1000;
    }

    let top = groups.len() - 1;
    let mut parts: Vec<String> = Vec::new();
    for (index, &group) in groups.iter().enumerate().rev() {
        if group == 0 {
            continue;
        }
        let mut part = spell_group(group, index != top);
        let scale = scale_name(index);
        if !scale.is_empty() {
            part.push(' ');
            part.push_str(&scale);
        }
        parts.push(part);
    }
    parts.join(" ")
}

/// Scale word for the group at `index` (0 = units): every third group adds a `tỷ`.
fn scale_name(index: usize) -> String {
    let mut words: Vec<&str> = Vec::new();
    if !GROUP_NAMES[index % 3].is_empty() {
        words.push(GROUP_NAMES[index % 3]);
    }
    for _ in 0..index / 3 {
        words.push("tỷ");
    }
    words.join(" ")
}

/// Read a group of three digits. `full` forces the hundreds to be spoken.
fn spell_group(group: usize, full: bool) -> String {
    let hundreds = group / 100;
    let tens = (group / 10) % 10;
    let units = group % 10;
    let mut words: Vec<&str> = Vec::new();

    if hundreds > 0 || full {
        words.push(DIGITS[hundreds]);
        words.push("trăm");
    }

    match tens {
        0 => {
            if units > 0 {
                if !words.is_empty() {
                    words.push("lẻ");
                }
                words.push(DIGITS[units]);
            }
        }
        1 => {
            words.push("mười");
            match units {
                0 => {}
                5 => words.push("lăm"),
                u => words.push(DIGITS[u]),
            }
        }
        t => {
            words.push(DIGITS[t]);
            words.push("mươi");
            match units {
                0 => {}
                1 => words.push("mốt"),
                5 => words.push("lăm"),
                u => words.push(DIGITS[u]),
            }
        }
    }

    words.join(" ")
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
