use compact_str::CompactString;
use rustc_hash::FxBuildHasher;
use std::collections::HashMap;
use std::sync::LazyLock;

/// The forced-safe-search variant of the Yandex family. Yandex publishes a
/// fixed address for it, so these hosts are answered without a resolver.
pub(crate) const YANDEX_SAFE_HOST: &str = "yandex.ru";
pub(crate) const GOOGLE_SAFE_HOST: &str = "forcesafesearch.google.com";

const YANDEX_TLDS: &[&str] = &["ru", "com", "ua", "by", "kz"];

/// Every ccTLD Google serves `www.google.<tld>` under.
const GOOGLE_TLDS: &[&str] = &[
    "com", "ad", "ae", "com.af", "com.ag", "com.ai", "al", "am", "co.ao", "com.ar", "as", "at",
    "com.au", "az", "ba", "com.bd", "be", "bf", "bg", "com.bh", "bi", "bj", "com.bn", "com.bo",
    "com.br", "bs", "bt", "co.bw", "by", "com.bz", "ca", "cat", "cd", "cf", "cg", "ch", "ci",
    "co.ck", "cl", "cm", "cn", "com.co", "co.cr", "com.cu", "cv", "com.cy", "cz", "de", "dj",
    "dk", "dm", "com.do", "dz", "com.ec", "ee", "com.eg", "es", "com.et", "fi", "com.fj", "fm",
    "fr", "ga", "ge", "gg", "com.gh", "com.gi", "gl", "gm", "gp", "gr", "com.gt", "gy", "com.hk",
    "hn", "hr", "ht", "hu", "co.id", "ie", "co.il", "im", "co.in", "iq", "is", "it", "je",
    "com.jm", "jo", "co.jp", "co.ke", "com.kh", "ki", "kg", "co.kr", "com.kw", "kz", "la",
    "com.lb", "li", "lk", "co.ls", "lt", "lu", "lv", "com.ly", "co.ma", "md", "me", "mg", "mk",
    "ml", "com.mm", "mn", "ms", "com.mt", "mu", "mv", "mw", "com.mx", "com.my", "co.mz",
    "com.na", "com.nf", "com.ng", "com.ni", "ne", "nl", "no", "com.np", "nr", "nu", "co.nz",
    "com.om", "com.pa", "com.pe", "com.pg", "com.ph", "com.pk", "pl", "pn", "com.pr", "ps",
    "pt", "com.py", "com.qa", "ro", "rs", "ru", "rw", "com.sa", "com.sb", "sc", "se", "com.sg",
    "sh", "si", "sk", "com.sl", "sn", "so", "sm", "sr", "st", "com.sv", "td", "tg", "co.th",
    "com.tj", "tk", "tl", "tm", "tn", "to", "com.tr", "tt", "com.tw", "co.tz", "com.ua",
    "co.ug", "co.uk", "com.uy", "co.uz", "com.vc", "co.ve", "vg", "co.vi", "com.vn", "vu",
    "ws", "co.za", "co.zm", "co.zw",
];

/// Hosts with bespoke forced-safe variants.
const FIXED_REWRITES: &[(&str, &str)] = &[
    ("www.bing.com", "strict.bing.com"),
    ("duckduckgo.com", "safe.duckduckgo.com"),
    ("www.duckduckgo.com", "safe.duckduckgo.com"),
    ("www.youtube.com", "restrictmoderate.youtube.com"),
    ("m.youtube.com", "restrictmoderate.youtube.com"),
    ("youtubei.googleapis.com", "restrictmoderate.youtube.com"),
    ("youtube.googleapis.com", "restrictmoderate.youtube.com"),
    ("www.youtube-nocookie.com", "restrictmoderate.youtube.com"),
];

static REWRITES: LazyLock<HashMap<CompactString, &'static str, FxBuildHasher>> =
    LazyLock::new(|| {
        let mut table = HashMap::with_capacity_and_hasher(
            GOOGLE_TLDS.len() + YANDEX_TLDS.len() * 2 + FIXED_REWRITES.len(),
            FxBuildHasher,
        );

        for tld in YANDEX_TLDS {
            table.insert(CompactString::new(format!("yandex.{tld}")), YANDEX_SAFE_HOST);
            table.insert(
                CompactString::new(format!("www.yandex.{tld}")),
                YANDEX_SAFE_HOST,
            );
        }

        for tld in GOOGLE_TLDS {
            table.insert(
                CompactString::new(format!("www.google.{tld}")),
                GOOGLE_SAFE_HOST,
            );
        }

        for (host, safe) in FIXED_REWRITES {
            table.insert(CompactString::new(*host), *safe);
        }

        table
    });

/// The forced-safe-search host for `host`, if the table knows it.
/// `host` must already be lowercase.
pub(crate) fn rewrite(host: &str) -> Option<&'static str> {
    REWRITES.get(host).copied()
}
