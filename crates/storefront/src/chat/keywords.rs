//! Canned answers matched by keyword.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// One canned answer and the keywords that trigger it.
#[derive(Debug, Clone)]
pub struct KeywordEntry {
    /// Short name used in logs.
    pub topic: &'static str,
    /// Keywords as folded word sequences.
    keywords: Vec<Vec<String>>,
    pub answer: &'static str,
}

impl KeywordEntry {
    #[must_use]
    pub fn new(topic: &'static str, keywords: &[&str], answer: &'static str) -> Self {
        Self {
            topic,
            keywords: keywords
                .iter()
                .map(|k| words(&fold(k)))
                .filter(|k| !k.is_empty())
                .collect(),
            answer,
        }
    }

    /// Number of this entry's keywords appearing as whole words in `input`.
    fn hits(&self, input: &[String]) -> usize {
        self.keywords
            .iter()
            .filter(|keyword| {
                input
                    .windows(keyword.len())
                    .any(|window| window == keyword.as_slice())
            })
            .count()
    }
}

/// Ordered table of canned answers.
#[derive(Debug, Clone)]
pub struct KeywordTable {
    entries: Vec<KeywordEntry>,
}

impl KeywordTable {
    #[must_use]
    pub const fn new(entries: Vec<KeywordEntry>) -> Self {
        Self { entries }
    }

    /// The entry with the most keyword hits; earlier entries win ties.
    #[must_use]
    pub fn best_match(&self, message: &str) -> Option<&KeywordEntry> {
        let input = words(&fold(message));
        let mut best: Option<(&KeywordEntry, usize)> = None;
        for entry in &self.entries {
            let hits = entry.hits(&input);
            if hits > 0 && best.is_none_or(|(_, top)| hits > top) {
                best = Some((entry, hits));
            }
        }
        best.map(|(entry, _)| entry)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self::new(vec![
            KeywordEntry::new(
                "shipping",
                &["giao hàng", "vận chuyển", "ship", "phí giao", "bao lâu nhận"],
                "Mobistore giao hàng toàn quốc. Nội thành Hà Nội và TP.HCM nhận trong 2-4 giờ, \
                 các tỉnh khác 2-4 ngày làm việc. Miễn phí giao hàng cho đơn từ 500.000 ₫.",
            ),
            KeywordEntry::new(
                "warranty",
                &["bảo hành", "bị hỏng", "lỗi máy", "sửa chữa"],
                "Máy mới được bảo hành chính hãng 12 tháng, máy like new và đã qua sử dụng \
                 được bảo hành 6 tháng tại cửa hàng. Lỗi phần cứng trong 30 ngày đầu được đổi máy mới.",
            ),
            KeywordEntry::new(
                "installment",
                &["trả góp", "mua góp", "lãi suất", "trả trước", "kỳ hạn"],
                "Mobistore hỗ trợ trả góp 0% lãi suất kỳ hạn 3, 6, 9 hoặc 12 tháng, trả trước \
                 từ 0% đến 70%. Chọn \"Trả góp\" khi thanh toán, hồ sơ sẽ được duyệt trong 24 giờ.",
            ),
            KeywordEntry::new(
                "payment",
                &["thanh toán", "chuyển khoản", "qr", "cod", "tiền mặt"],
                "Bạn có thể thanh toán khi nhận hàng (COD), chuyển khoản qua mã QR hoặc trả góp. \
                 Với chuyển khoản, vui lòng hoàn tất trong 15 phút sau khi đặt hàng.",
            ),
            KeywordEntry::new(
                "returns",
                &["đổi trả", "trả hàng", "hoàn tiền", "đổi máy"],
                "Sản phẩm được đổi trả trong 7 ngày nếu còn nguyên hộp và phụ kiện. \
                 Tiền hoàn về tài khoản trong 3-5 ngày làm việc.",
            ),
            KeywordEntry::new(
                "hours",
                &["giờ mở cửa", "mở cửa", "đóng cửa", "mấy giờ", "giờ làm việc"],
                "Cửa hàng mở cửa từ 8:00 đến 21:30 tất cả các ngày trong tuần, kể cả ngày lễ.",
            ),
            KeywordEntry::new(
                "contact",
                &["liên hệ", "hotline", "số điện thoại", "địa chỉ", "cửa hàng ở đâu"],
                "Hotline 1900 6868 (8:00-21:30), email hotro@mobistore.vn. \
                 Cửa hàng: 123 Nguyễn Trãi, Quận 1, TP.HCM.",
            ),
        ])
    }
}

/// Lowercase and strip Vietnamese diacritics.
///
/// Input is decomposed first, so precomposed and combining-mark spellings
/// fold the same way.
///
/// ```
/// use mobistore_storefront::chat::fold;
///
/// assert_eq!(fold("Trả Góp"), "tra gop");
/// assert_eq!(fold("ĐỔI TRẢ"), "doi tra");
/// assert_eq!(fold("tra\u{309} go\u{301}p"), "tra gop");
/// ```
#[must_use]
pub fn fold(input: &str) -> String {
    input
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .map(|c| if c == 'đ' { 'd' } else { c })
        .collect()
}

/// Alphanumeric runs of `input`.
fn words(input: &str) -> Vec<String> {
    input
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_strips_diacritics() {
        assert_eq!(fold("Giao hàng bao lâu?"), "giao hang bao lau?");
        assert_eq!(fold("Đường Lê Lợi"), "duong le loi");
    }

    #[test]
    fn test_match_without_diacritics() {
        let table = KeywordTable::default();
        let entry = table.best_match("cho minh hoi tra gop the nao").map(|e| e.topic);
        assert_eq!(entry, Some("installment"));
    }

    #[test]
    fn test_most_hits_wins() {
        let table = KeywordTable::new(vec![
            KeywordEntry::new("a", &["máy"], "A"),
            KeywordEntry::new("b", &["máy", "bảo hành"], "B"),
        ]);
        assert_eq!(table.best_match("Máy này bảo hành bao lâu").map(|e| e.topic), Some("b"));
    }

    #[test]
    fn test_ties_go_to_table_order() {
        let table = KeywordTable::new(vec![
            KeywordEntry::new("first", &["qr"], "1"),
            KeywordEntry::new("second", &["cod"], "2"),
        ]);
        assert_eq!(table.best_match("qr hay cod").map(|e| e.topic), Some("first"));
    }

    #[test]
    fn test_fold_decomposed_input() {
        assert_eq!(fold("tra\u{309} go\u{301}p"), "tra gop");
        assert_eq!(fold("Đo\u{302}\u{309}i tra\u{309}"), "doi tra");
        assert_eq!(fold("u\u{31b}\u{300}"), fold("ừ"));
    }

    #[test]
    fn test_match_decomposed_input() {
        let table = KeywordTable::default();
        let entry = table.best_match("Mua tra\u{309} go\u{301}p được không?").map(|e| e.topic);
        assert_eq!(entry, Some("installment"));
    }

    #[test]
    fn test_keywords_match_whole_words() {
        let table = KeywordTable::default();
        assert!(table.best_match("Góp ý cho shop một chút").is_none());
        assert!(table.best_match("Mã code giảm giá nhập ở đâu?").is_none());
        assert_eq!(
            table.best_match("Thanh toán COD được không?").map(|e| e.topic),
            Some("payment")
        );
        assert_eq!(
            table.best_match("mua góp iPhone").map(|e| e.topic),
            Some("installment")
        );
    }

    #[test]
    fn test_multi_word_keyword_needs_adjacent_words() {
        let table = KeywordTable::new(vec![KeywordEntry::new("x", &["trả góp"], "X")]);
        assert!(table.best_match("trả lại tiền góp vốn").is_none());
        assert!(table.best_match("trả, góp").is_some());
    }

    #[test]
    fn test_no_match() {
        let table = KeywordTable::default();
        assert!(table.best_match("iPhone 15 có màu gì?").is_none());
    }
}
