//! Fixed label wording shared by both renderers.
//!
//! Every piece of boilerplate printed on a label lives here. Both renderers
//! and their tests read the same constants.

/// Product name printed centred in the header.
pub const PRODUCT_TITLE: &str = "ПИЦЦА СОУС";

/// Processing note printed right-aligned in the header.
pub const PASTEURISED_NOTE: &str = "(ПРОДУКТ ПАСТЕРИЗОВАН)";

/// Bold sentence closing the legal block.
pub const ORIGIN_STATEMENT: &str = "Произведено в Республике Армения.";

/// Dashed rule opening the legal block in the Word layout.
pub const LEGAL_RULE: &str =
    "--------------------------------------------------------------------------------";

/// Composition, nutrition, storage, shelf life, manufacturer and regulatory
/// code, pre-split at authoring time. Neither renderer wraps text.
pub const LEGAL_LINES: &[&str] = &[
    "Состав: Томаты, соль пищевая, регулятор кислотности (лимонная кислота).",
    "Пищевая ценность на 100 г. продукта: углеводы - 9,0г, жиры - 0,0г",
    "энергетическая ценность - 36,0 ккал/153,0 КДж.",
    "Хранить в сухом, прохладном месте при температуре от +0°С до +25°C и",
    "относительной влажности воздуха не более 75%. После вскрытия хранить при",
    "температуре от +0°С до +5°С не более 24 часа.",
    "Срок годности: 12 месяцев с даты изготовления.",
    "Изготовитель: ООО \"Эребуни Трейд Груп\".",
    "Юридический адрес: РА, г. Ереван, ул. Аветисян, дом 23.",
    "Адрес производства: Республика Армения, Араратский рег., г. Арташат,",
    "ул. Самвела Акопяна, стр. 173.",
    "Тел: (+374) 77-733-388 Email: erebunit@gmail.com",
    "ТУ AM 51192101. 9183-2023",
];

/// Lines of the legal block as drawn on the PDF label.
///
/// The regulatory code is set off by one blank line.
pub fn pdf_legal_lines() -> impl Iterator<Item = &'static str> {
    let (body, code) = LEGAL_LINES.split_at(LEGAL_LINES.len() - 1);
    body.iter().copied().chain(std::iter::once("")).chain(code.iter().copied())
}

/// Lines of the legal block as written into the Word paragraph.
pub fn word_legal_lines() -> impl Iterator<Item = &'static str> {
    std::iter::once(LEGAL_RULE).chain(LEGAL_LINES.iter().copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_block_has_blank_line_before_regulatory_code() {
        let lines: Vec<_> = pdf_legal_lines().collect();
        assert_eq!(lines.len(), LEGAL_LINES.len() + 1);
        assert_eq!(lines[lines.len() - 2], "");
        assert!(lines[lines.len() - 1].starts_with("ТУ AM"));
    }

    #[test]
    fn word_block_opens_with_rule() {
        let lines: Vec<_> = word_legal_lines().collect();
        assert_eq!(lines[0], LEGAL_RULE);
        assert_eq!(lines.len(), LEGAL_LINES.len() + 1);
        assert!(!lines.contains(&""));
    }

    #[test]
    fn legal_text_names_manufacturer() {
        assert!(LEGAL_LINES.iter().any(|l| l.contains("Эребуни Трейд Груп")));
    }
}
