//! Stopword and stemming capabilities behind a single injectable trait.
//!
//! The preprocessing pipeline never probes for a stemmer at runtime; the
//! capability is picked once from [`LinguisticKind`] (or injected directly) and
//! [`NoopLinguistic`] stands in when none is wanted.

use crate::config::LinguisticKind;
use lazy_static::lazy_static;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use std::sync::Arc;

pub trait Linguistic: Send + Sync {
    /// Short identifier, logged when a pipeline is assembled.
    fn name(&self) -> &'static str;
    /// Reduce a token to its stem. Must not fail; unknown shapes pass through.
    fn stem(&self, token: &str) -> String;
    fn is_stopword(&self, token: &str) -> bool;
}

/// Resolve the capability for a configured kind.
pub fn linguistic_for(kind: LinguisticKind) -> Arc<dyn Linguistic> {
    match kind {
        LinguisticKind::Indonesian => Arc::new(IndonesianLinguistic),
        LinguisticKind::English => Arc::new(SnowballLinguistic::english()),
        LinguisticKind::None => Arc::new(NoopLinguistic),
    }
}

/// Identity stemming, no stopwords.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLinguistic;

impl Linguistic for NoopLinguistic {
    fn name(&self) -> &'static str { "noop" }
    fn stem(&self, token: &str) -> String { token.to_string() }
    fn is_stopword(&self, _token: &str) -> bool { false }
}

/// Snowball stemmer from `rust-stemmers` paired with an English stopword list.
pub struct SnowballLinguistic {
    stemmer: Stemmer,
}

impl SnowballLinguistic {
    pub fn english() -> Self {
        Self { stemmer: Stemmer::create(Algorithm::English) }
    }
}

impl Linguistic for SnowballLinguistic {
    fn name(&self) -> &'static str { "snowball-english" }
    fn stem(&self, token: &str) -> String { self.stemmer.stem(token).into_owned() }
    fn is_stopword(&self, token: &str) -> bool { ENGLISH_STOPWORDS.contains(token) }
}

/// Rule-based Indonesian affix stripper with a stopword list.
///
/// Removes, in order: particles (-lah, -kah, -tah, -pun), possessives
/// (-ku, -mu, -nya), one derivational suffix (-kan, -an, -i) and one prefix
/// (me-/pe- families with phoneme recoding, ber-, ter-, per-, di-, and ke- only
/// when it closes a ke-...-an confix). A root-word list is consulted after every
/// step and stops stripping early.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndonesianLinguistic;

impl Linguistic for IndonesianLinguistic {
    fn name(&self) -> &'static str { "indonesian" }
    fn stem(&self, token: &str) -> String { stem_indonesian(token) }
    fn is_stopword(&self, token: &str) -> bool { INDONESIAN_STOPWORDS.contains(token) }
}

const MIN_STEM: usize = 4;
const PARTICLES: &[&str] = &["lah", "kah", "tah", "pun"];
const POSSESSIVES: &[&str] = &["nya", "ku", "mu"];
const DERIVATIONAL: &[&str] = &["kan", "an", "i"];
// Longest first so "meng" wins over "men" and "me".
const PREFIXES: &[&str] = &[
    "memper", "diper", "meng", "peng", "meny", "peny", "mem", "pem", "men", "pen", "ber", "ter",
    "per", "me", "pe", "di", "ke",
];

fn stem_indonesian(word: &str) -> String {
    if word.len() <= MIN_STEM || is_root(word) {
        return word.to_string();
    }
    let mut current = word.to_string();
    for group in [PARTICLES, POSSESSIVES] {
        if let Some(rest) = strip_inflectional(&current, group) {
            current = rest;
            if is_root(&current) {
                return current;
            }
        }
    }
    let mut confix = false;
    if let Some(rest) = strip_derivational(&current) {
        confix = true;
        current = rest;
        if is_root(&current) {
            return current;
        }
    }
    strip_prefix(&current, confix).unwrap_or(current)
}

fn is_root(word: &str) -> bool { ROOT_WORDS.contains(word) }

fn is_vowel(c: char) -> bool { matches!(c, 'a' | 'e' | 'i' | 'o' | 'u') }

fn strip_inflectional(word: &str, suffixes: &[&str]) -> Option<String> {
    suffixes
        .iter()
        .filter_map(|s| word.strip_suffix(s))
        .find(|rest| rest.len() >= MIN_STEM)
        .map(str::to_string)
}

fn strip_derivational(word: &str) -> Option<String> {
    let mut viable = DERIVATIONAL.iter().filter_map(|suffix| {
        let rest = word.strip_suffix(suffix)?;
        if rest.len() < MIN_STEM {
            return None;
        }
        // "-i" after a vowel or after "s" (infeksi, iritasi) belongs to the root.
        if *suffix == "i" && rest.ends_with(|c: char| is_vowel(c) || c == 's') {
            return None;
        }
        Some(rest)
    });
    let first = viable.next()?;
    if is_root(first) {
        return Some(first.to_string());
    }
    Some(viable.find(|rest| is_root(rest)).unwrap_or(first).to_string())
}

fn strip_prefix(word: &str, confix: bool) -> Option<String> {
    PREFIXES
        .iter()
        .find_map(|prefix| word.strip_prefix(prefix).and_then(|rest| recode(prefix, rest, confix)))
}

fn recode(prefix: &str, rest: &str, confix: bool) -> Option<String> {
    let first = rest.chars().next()?;
    let vowel = is_vowel(first);
    let stem = match prefix {
        "memper" | "diper" | "ber" | "ter" | "per" | "di" => rest.to_string(),
        "meng" | "peng" if vowel || matches!(first, 'g' | 'h' | 'k') => rest.to_string(),
        "meny" | "peny" if vowel => format!("s{rest}"),
        "mem" | "pem" if vowel => format!("p{rest}"),
        "mem" | "pem" if matches!(first, 'b' | 'f' | 'p' | 'v') => rest.to_string(),
        "men" | "pen" if vowel => format!("t{rest}"),
        "men" | "pen" if matches!(first, 'c' | 'd' | 'j' | 'z') => rest.to_string(),
        "me" | "pe" if matches!(first, 'l' | 'm' | 'n' | 'r' | 'w' | 'y') => rest.to_string(),
        "ke" if confix => rest.to_string(),
        _ => return None,
    };
    (stem.len() >= MIN_STEM).then_some(stem)
}

lazy_static! {
    static ref ENGLISH_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","cannot","could","did","do","does","doing","down","during",
            "each","few","for","from","further",
            "had","has","have","having","he","her","here","hers","herself","him","himself","his","how",
            "i","if","in","into","is","it","its","itself",
            "me","more","most","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","should","so","some","such",
            "than","that","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
            "under","until","up","very",
            "was","we","were","what","when","where","which","while","who","whom","why","with","would",
            "you","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
    static ref INDONESIAN_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "ada","adalah","agar","akan","aku","anda","antara","apa","apabila","atas","atau",
            "bagi","bahwa","banyak","beberapa","belum","berbagai","biasanya","bila","bisa","boleh",
            "dalam","dan","dapat","dari","demikian","dengan","di","dia","hal","hanya","harus","hingga",
            "ini","itu","jadi","jika","juga","kali","kami","kamu","karena","ke","kepada","ketika","kita",
            "lagi","lain","lebih","maka","masih","mereka","namun","oleh",
            "pada","para","perlu","pun","saat","saja","sama","sampai","sangat","sebagai","sebelum",
            "secara","sedang","sehingga","selain","selama","semua","sendiri","seperti","serta",
            "setelah","setiap","sudah","tanpa","telah","tersebut","tetapi","tidak",
            "untuk","yaitu","yakni","yang"
        ];
        words.iter().copied().collect()
    };
    static ref ROOT_WORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "alergi","anak","anemia","asam","asma","badan","bakar","bakteri","batuk","bayi","bengkak",
            "bersin","besi","cacing","dahak","darah","demam","dermatitis","dewasa","diabetes","diare",
            "diet","dingin","dosis","ginjal","gatal","gigi","gula","haid","hamil","hati","hidung",
            "hipertensi","infeksi","iritasi","jamur","jantung","kalsium","kejang","kelamin","kepala",
            "keram","kering","keringat","kolesterol","krim","kuman","kulit","lambung","lelah","lemak",
            "lemas","linu","luka","maag","makan","mata","memar","menstruasi","menyusui","migrain",
            "minum","minyak","mual","muntah","nafas","napas","nyeri","obat","otot","panas","paru",
            "pegal","perut","pilek","pusing","racun","radang","reda","ringan","ruam","sakit","salep",
            "sehat","sembelit","sendi","serak","sesak","tekan","telinga","tenggorok","terapi","tetes",
            "tidur","tulang","turun","virus","vitamin","wasir"
        ];
        words.iter().copied().collect()
    };
}
