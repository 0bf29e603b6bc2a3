// core/src/syllable.rs
//
// The legal toneless pinyin syllable table, the `Syllable` unit the
// segmenter produces, and the lazily built trie shared by all sessions.

use once_cell::sync::Lazy;

use crate::trie::SyllableTrie;

/// All standard Mandarin pinyin syllables without tone markers.
pub const PINYIN_SYLLABLES: &[&str] = &[
    "a", "ai", "an", "ang", "ao", "ba", "bai", "ban", "bang", "bao", "bei", "ben", "beng", "bi",
    "bian", "biao", "bie", "bin", "bing", "bo", "bu", "ca", "cai", "can", "cang", "cao", "ce",
    "cen", "ceng", "cha", "chai", "chan", "chang", "chao", "che", "chen", "cheng", "chi", "chong",
    "chou", "chu", "chuai", "chuan", "chuang", "chui", "chun", "chuo", "ci", "cong", "cou", "cu",
    "cuan", "cui", "cun", "cuo", "da", "dai", "dan", "dang", "dao", "de", "dei", "deng", "di",
    "dia", "dian", "diao", "die", "ding", "diu", "dong", "dou", "du", "duan", "dui", "dun", "duo",
    "e", "ei", "en", "er", "fa", "fan", "fang", "fei", "fen", "feng", "fo", "fou", "fu", "ga",
    "gai", "gan", "gang", "gao", "ge", "gei", "gen", "geng", "gong", "gou", "gu", "gua", "guai",
    "guan", "guang", "gui", "gun", "guo", "ha", "hai", "han", "hang", "hao", "he", "hei", "hen",
    "heng", "hong", "hou", "hu", "hua", "huai", "huan", "huang", "hui", "hun", "huo", "ji", "jia",
    "jian", "jiang", "jiao", "jie", "jin", "jing", "jiong", "jiu", "ju", "juan", "jue", "jun",
    "ka", "kai", "kan", "kang", "kao", "ke", "ken", "keng", "kong", "kou", "ku", "kua", "kuai",
    "kuan", "kuang", "kui", "kun", "kuo", "la", "lai", "lan", "lang", "lao", "le", "lei", "leng",
    "li", "lia", "lian", "liang", "liao", "lie", "lin", "ling", "liu", "lo", "long", "lou", "lu",
    "luan", "lun", "luo", "lv", "lve", "ma", "mai", "man", "mang", "mao", "me", "mei", "men",
    "meng", "mi", "mian", "miao", "mie", "min", "ming", "miu", "mo", "mou", "mu", "na", "nai",
    "nan", "nang", "nao", "ne", "nei", "nen", "neng", "ng", "ni", "nian", "niang", "niao", "nie",
    "nin", "ning", "niu", "nong", "nou", "nu", "nuan", "nuo", "nv", "nve", "o", "ou", "pa", "pai",
    "pan", "pang", "pao", "pei", "pen", "peng", "pi", "pian", "piao", "pie", "pin", "ping", "po",
    "pou", "pu", "qi", "qia", "qian", "qiang", "qiao", "qie", "qin", "qing", "qiong", "qiu", "qu",
    "quan", "que", "qun", "ran", "rang", "rao", "re", "ren", "reng", "ri", "rong", "rou", "ru",
    "ruan", "rui", "run", "ruo", "sa", "sai", "san", "sang", "sao", "se", "sen", "seng", "sha",
    "shai", "shan", "shang", "shao", "she", "shei", "shen", "sheng", "shi", "shou", "shu", "shua",
    "shuai", "shuan", "shuang", "shui", "shun", "shuo", "si", "song", "sou", "su", "suan", "sui",
    "sun", "suo", "ta", "tai", "tan", "tang", "tao", "te", "teng", "ti", "tian", "tiao", "tie",
    "ting", "tong", "tou", "tu", "tuan", "tui", "tun", "tuo", "wa", "wai", "wan", "wang", "wei",
    "wen", "weng", "wo", "wu", "xi", "xia", "xian", "xiang", "xiao", "xie", "xin", "xing", "xiong",
    "xiu", "xu", "xuan", "xue", "xun", "ya", "yan", "yang", "yao", "ye", "yi", "yin", "ying", "yo",
    "yong", "you", "yu", "yuan", "yue", "yun", "za", "zai", "zan", "zang", "zao", "ze", "zei",
    "zen", "zeng", "zha", "zhai", "zhan", "zhang", "zhao", "zhe", "zhen", "zheng", "zhi", "zhong",
    "zhou", "zhu", "zhua", "zhuai", "zhuan", "zhuang", "zhui", "zhun", "zhuo", "zi", "zong", "zou",
    "zu", "zuan", "zui", "zun", "zuo",
];

static SYLLABLE_TRIE: Lazy<SyllableTrie> =
    Lazy::new(|| SyllableTrie::from_syllables(PINYIN_SYLLABLES));

/// The trie over `PINYIN_SYLLABLES`, built once per process.
pub fn syllable_trie() -> &'static SyllableTrie {
    &SYLLABLE_TRIE
}

/// One matched chunk of pinyin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Syllable {
    /// Matched text, e.g. "ni", "hao". For a partial syllable this is the
    /// typed fragment, e.g. "zh".
    pub text: String,

    /// True when the user has not finished the syllable: `text` is a proper
    /// prefix of a legal syllable. Only ever set on the final syllable of a
    /// segmentation.
    pub partial: bool,
}

impl Syllable {
    pub fn new<T: Into<String>>(text: T, partial: bool) -> Self {
        Self {
            text: text.into(),
            partial,
        }
    }

    /// Number of input characters this syllable consumed.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Join syllables into a dictionary lookup key, e.g. `["ni","hao"]` ->
/// `"ni'hao"`. The apostrophe keeps syllable boundaries unambiguous in the
/// index ("xi'an" never collides with "xian").
pub fn join_key(syllables: &[Syllable]) -> String {
    syllables
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<&str>>()
        .join("'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_contains_common_syllables() {
        for s in ["ni", "hao", "zhong", "guo", "pin", "yin", "xian", "lv"] {
            assert!(PINYIN_SYLLABLES.contains(&s), "missing {}", s);
        }
        assert!(PINYIN_SYLLABLES.len() > 400);
    }

    #[test]
    fn shared_trie_answers_prefix_queries() {
        let trie = syllable_trie();
        assert!(trie.contains_word("zhuang"));
        let nih: Vec<char> = "zh".chars().collect();
        assert!(trie.is_strict_prefix(&nih));
    }

    #[test]
    fn join_key_disambiguates_boundaries() {
        let xi_an = vec![Syllable::new("xi", false), Syllable::new("an", false)];
        let xian = vec![Syllable::new("xian", false)];
        assert_eq!(join_key(&xi_an), "xi'an");
        assert_eq!(join_key(&xian), "xian");
        assert_ne!(join_key(&xi_an), join_key(&xian));
    }
}
