/// 文件名到查找键的转换
///
/// 小写 → 删除所有 `.pdf` 子串 → `-` 替换为 `_`
///
/// `.pdf` 在任意位置都会被删除，不只是后缀（`"x.pdf.pdf"` → `"x"`）
pub fn to_key(filename: &str) -> String {
    filename.to_lowercase().replace(".pdf", "").replace('-', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_examples() {
        assert_eq!(to_key("Report.PDF"), "report");
        assert_eq!(to_key("My-CV-2024.pdf"), "my_cv_2024");
        assert_eq!(to_key("plain"), "plain");
        assert_eq!(to_key(""), "");
    }

    #[test]
    fn test_pdf_removed_anywhere() {
        assert_eq!(to_key("pdf_report.pdf"), "pdf_report");
        assert_eq!(to_key("a.pdf.pdf"), "a");
        assert_eq!(to_key("notes.PDF.backup"), "notes.backup");
        assert_eq!(to_key("scan.pdfx"), "scanx");
    }

    #[test]
    fn test_other_characters_untouched() {
        assert_eq!(to_key("Jane Doe - CV.docx"), "jane doe _ cv.docx");
        assert_eq!(to_key("ÉLODIE-CV.pdf"), "élodie_cv");
    }

    #[test]
    fn test_result_is_lowercase_without_hyphens() {
        for name in ["A-B-C.PDF", "--", "X.Pdf-Y", "MiXeD-Case.pdf", "ÀÉ-Ö"] {
            let key = to_key(name);
            assert!(!key.contains('-'), "{key}");
            assert_eq!(key, key.to_lowercase());
        }
    }

    #[test]
    fn test_idempotent() {
        for name in ["My-CV-2024.pdf", "Report.PDF", "pdf_report.pdf", "a--b"] {
            let key = to_key(name);
            assert_eq!(to_key(&key), key);
        }
    }
}
