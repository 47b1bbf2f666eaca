/// Flag glyph for a 2-letter country code; globe placeholder otherwise.
#[must_use]
pub fn flag_for(code: &str) -> &'static str {
    match code {
        "MX" => "🇲🇽",
        "JP" => "🇯🇵",
        "TR" => "🇹🇷",
        "EG" => "🇪🇬",
        "ZA" => "🇿🇦",
        "KZ" => "🇰🇿",
        "BR" => "🇧🇷",
        "AR" => "🇦🇷",
        "CL" => "🇨🇱",
        "CO" => "🇨🇴",
        "PE" => "🇵🇪",
        "IN" => "🇮🇳",
        "PH" => "🇵🇭",
        "ID" => "🇮🇩",
        "TH" => "🇹🇭",
        "VN" => "🇻🇳",
        "MY" => "🇲🇾",
        "SG" => "🇸🇬",
        "KR" => "🇰🇷",
        "TW" => "🇹🇼",
        "HK" => "🇭🇰",
        "AE" => "🇦🇪",
        "SA" => "🇸🇦",
        "IL" => "🇮🇱",
        "RU" => "🇷🇺",
        "UA" => "🇺🇦",
        "PL" => "🇵🇱",
        "DE" => "🇩🇪",
        "FR" => "🇫🇷",
        "GB" | "UK" => "🇬🇧",
        "ES" => "🇪🇸",
        "IT" => "🇮🇹",
        "NL" => "🇳🇱",
        "SE" => "🇸🇪",
        "NO" => "🇳🇴",
        "FI" => "🇫🇮",
        "DK" => "🇩🇰",
        "CH" => "🇨🇭",
        "AT" => "🇦🇹",
        "BE" => "🇧🇪",
        "PT" => "🇵🇹",
        "CZ" => "🇨🇿",
        "RO" => "🇷🇴",
        "HU" => "🇭🇺",
        "GR" => "🇬🇷",
        "US" => "🇺🇸",
        "CA" => "🇨🇦",
        "AU" => "🇦🇺",
        "NZ" => "🇳🇿",
        "IE" => "🇮🇪",
        "IS" => "🇮🇸",
        "LU" => "🇱🇺",
        "SK" => "🇸🇰",
        "SI" => "🇸🇮",
        "HR" => "🇭🇷",
        "BG" => "🇧🇬",
        "RS" => "🇷🇸",
        "LT" => "🇱🇹",
        "LV" => "🇱🇻",
        "EE" => "🇪🇪",
        "CY" => "🇨🇾",
        "MT" => "🇲🇹",
        "PA" => "🇵🇦",
        "CR" => "🇨🇷",
        _ => "🌍",
    }
}

#[cfg(test)]
mod tests {
    use super::flag_for;

    #[test]
    fn known_codes_have_flags() {
        assert_eq!(flag_for("DE"), "🇩🇪");
        assert_eq!(flag_for("US"), "🇺🇸");
        // Legacy alias.
        assert_eq!(flag_for("UK"), flag_for("GB"));
    }

    #[test]
    fn unrecognized_codes_get_globe() {
        assert_eq!(flag_for("??"), "🌍");
        assert_eq!(flag_for("XX"), "🌍");
    }
}
