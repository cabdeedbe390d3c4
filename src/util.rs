/// トークンをマスキングしてログ出力用の文字列を生成
///
/// トークンの最初の4文字と最後の4文字のみを表示し、中間を***でマスキング
///
/// # Examples
/// ```
/// use hq_client::util::mask_token;
///
/// let masked = mask_token("eyJhbGciOiJIUzI1NiJ9.payload.sig");
/// assert_eq!(masked, "eyJh***.sig");
/// ```
pub fn mask_token(token: &str) -> String {
    let len = token.chars().count();
    if len <= 8 {
        // 短いトークン（空文字列を含む）は全体をマスク
        return "***".to_string();
    }

    let prefix: String = token.chars().take(4).collect();
    let suffix: String = token.chars().skip(len - 4).collect();
    format!("{}***{}", prefix, suffix)
}
