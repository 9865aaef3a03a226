//! Hanzi → pinyin
//!
//! A built-in table of common characters and phrases, extendable from a
//! `pinyin_dict.txt` file. Phrases are matched greedily (longest first) so
//! polyphones such as 行 read correctly in 银行; isolated characters take
//! their first listed reading. Tone sandhi is applied per run of Han
//! characters after lookup.

use phf::phf_map;
use std::collections::HashMap;
use std::path::Path;

use crate::errors::{PhonemizerError, PhonemizerResult};

/// Neutral (light) tone
pub const NEUTRAL_TONE: u8 = 5;

/// Default readings per character; the first reading of a polyphone wins
#[rustfmt::skip]
static CHAR_PINYIN: phf::Map<char, &'static str> = phf_map! {
    '的' => "de5,di4,di2", '一' => "yi1", '是' => "shi4", '不' => "bu4",
    '了' => "le5,liao3", '人' => "ren2", '我' => "wo3", '在' => "zai4",
    '有' => "you3", '他' => "ta1", '这' => "zhe4", '中' => "zhong1,zhong4",
    '大' => "da4", '来' => "lai2", '上' => "shang4", '国' => "guo2",
    '个' => "ge4", '到' => "dao4", '说' => "shuo1", '们' => "men5",
    '为' => "wei4,wei2", '子' => "zi3", '和' => "he2", '你' => "ni3",
    '地' => "di4,de5", '出' => "chu1", '道' => "dao4", '也' => "ye3",
    '时' => "shi2", '年' => "nian2", '得' => "de2,de5,dei3", '就' => "jiu4",
    '那' => "na4", '要' => "yao4", '下' => "xia4", '以' => "yi3",
    '生' => "sheng1", '会' => "hui4", '自' => "zi4", '着' => "zhe5,zhao2",
    '去' => "qu4", '之' => "zhi1", '过' => "guo4", '家' => "jia1",
    '学' => "xue2", '对' => "dui4", '可' => "ke3", '她' => "ta1",
    '里' => "li3", '后' => "hou4", '小' => "xiao3", '么' => "me5",
    '心' => "xin1", '多' => "duo1", '天' => "tian1", '而' => "er2",
    '能' => "neng2", '好' => "hao3,hao4", '都' => "dou1,du1", '然' => "ran2",
    '没' => "mei2", '日' => "ri4", '于' => "yu2", '起' => "qi3",
    '还' => "hai2,huan2", '发' => "fa1", '成' => "cheng2", '事' => "shi4",
    '只' => "zhi3", '作' => "zuo4", '当' => "dang1", '想' => "xiang3",
    '看' => "kan4", '文' => "wen2", '无' => "wu2", '开' => "kai1",
    '手' => "shou3", '十' => "shi2", '用' => "yong4", '主' => "zhu3",
    '行' => "xing2,hang2", '方' => "fang1", '又' => "you4", '如' => "ru2",
    '前' => "qian2", '所' => "suo3", '本' => "ben3", '见' => "jian4",
    '经' => "jing1", '头' => "tou2", '面' => "mian4", '公' => "gong1",
    '同' => "tong2", '三' => "san1", '已' => "yi3", '老' => "lao3",
    '从' => "cong2", '动' => "dong4", '两' => "liang3", '长' => "chang2,zhang3",
    '知' => "zhi1", '民' => "min2", '样' => "yang4", '现' => "xian4",
    '分' => "fen1", '将' => "jiang1", '外' => "wai4", '但' => "dan4",
    '身' => "shen1", '些' => "xie1", '与' => "yu3", '高' => "gao1",
    '意' => "yi4", '进' => "jin4", '把' => "ba3", '法' => "fa3",
    '此' => "ci3", '实' => "shi2", '回' => "hui2", '二' => "er4",
    '理' => "li3", '美' => "mei3", '点' => "dian3", '月' => "yue4",
    '明' => "ming2", '其' => "qi2", '种' => "zhong3,zhong4", '声' => "sheng1",
    '全' => "quan2", '工' => "gong1", '己' => "ji3", '话' => "hua4",
    '儿' => "er2", '者' => "zhe3", '向' => "xiang4", '情' => "qing2",
    '部' => "bu4", '正' => "zheng4", '名' => "ming2", '定' => "ding4",
    '女' => "nv3", '问' => "wen4", '力' => "li4", '机' => "ji1",
    '给' => "gei3", '等' => "deng3", '几' => "ji3", '很' => "hen3",
    '业' => "ye4", '最' => "zui4", '间' => "jian1", '新' => "xin1",
    '什' => "shen2", '打' => "da3", '便' => "bian4", '位' => "wei4",
    '因' => "yin1", '重' => "zhong4,chong2", '被' => "bei4", '走' => "zou3",
    '电' => "dian4", '四' => "si4", '第' => "di4", '门' => "men2",
    '相' => "xiang1", '次' => "ci4", '东' => "dong1", '政' => "zheng4",
    '海' => "hai3", '口' => "kou3", '使' => "shi3", '教' => "jiao4",
    '西' => "xi1", '再' => "zai4", '平' => "ping2", '真' => "zhen1",
    '听' => "ting1", '世' => "shi4", '气' => "qi4", '信' => "xin4",
    '北' => "bei3", '少' => "shao3", '关' => "guan1", '并' => "bing4",
    '内' => "nei4", '加' => "jia1", '化' => "hua4", '由' => "you2",
    '却' => "que4", '代' => "dai4", '军' => "jun1", '产' => "chan3",
    '入' => "ru4", '先' => "xian1", '山' => "shan1", '五' => "wu3",
    '太' => "tai4", '水' => "shui3", '万' => "wan4", '市' => "shi4",
    '眼' => "yan3", '体' => "ti3", '别' => "bie2", '处' => "chu4",
    '总' => "zong3", '才' => "cai2", '场' => "chang3", '师' => "shi1",
    '书' => "shu1", '比' => "bi3", '住' => "zhu4", '员' => "yuan2",
    '九' => "jiu3", '笑' => "xiao4", '性' => "xing4", '通' => "tong1",
    '目' => "mu4", '华' => "hua2", '报' => "bao4", '立' => "li4",
    '马' => "ma3", '命' => "ming4", '张' => "zhang1", '活' => "huo2",
    '难' => "nan2", '神' => "shen2", '数' => "shu4", '件' => "jian4",
    '安' => "an1", '表' => "biao3", '原' => "yuan2", '车' => "che1",
    '白' => "bai2", '应' => "ying1", '路' => "lu4", '期' => "qi1",
    '叫' => "jiao4", '死' => "si3", '常' => "chang2", '提' => "ti2",
    '感' => "gan3", '金' => "jin1", '何' => "he2", '更' => "geng4",
    '反' => "fan3", '合' => "he2", '放' => "fang4", '做' => "zuo4",
    '系' => "xi4", '六' => "liu4", '七' => "qi1", '八' => "ba1",
    '零' => "ling2", '百' => "bai3", '千' => "qian1", '亿' => "yi4",
    '吃' => "chi1", '喝' => "he1", '饭' => "fan4", '茶' => "cha2",
    '朋' => "peng2", '友' => "you3", '谢' => "xie4", '早' => "zao3",
    '晚' => "wan3", '请' => "qing3", '爱' => "ai4", '语' => "yu3",
    '言' => "yan2", '汉' => "han4", '字' => "zi4", '音' => "yin1",
    '乐' => "le4,yue4", '快' => "kuai4", '银' => "yin2", '朝' => "chao2,zhao1",
    '啊' => "a5", '吗' => "ma5", '呢' => "ne5", '吧' => "ba5",
    '哪' => "na3", '谁' => "shei2", '怎' => "zen3", '苹' => "ping2",
    '果' => "guo3", '猫' => "mao1", '狗' => "gou3", '鱼' => "yu2",
    '鸟' => "niao3", '花' => "hua1", '草' => "cao3", '树' => "shu4",
    '雨' => "yu3", '雪' => "xue3", '风' => "feng1", '云' => "yun2",
    '火' => "huo3", '木' => "mu4", '石' => "shi2", '土' => "tu3",
    '江' => "jiang1", '河' => "he2", '湖' => "hu2", '京' => "jing1",
    '城' => "cheng2", '街' => "jie1", '店' => "dian4", '钱' => "qian2",
    '买' => "mai3", '卖' => "mai4", '读' => "du2", '写' => "xie3",
    '唱' => "chang4", '歌' => "ge1", '跑' => "pao3", '飞' => "fei1",
    '坐' => "zuo4", '站' => "zhan4", '睡' => "shui4", '觉' => "jiao4,jue2",
    '醒' => "xing3", '冷' => "leng3", '热' => "re4", '红' => "hong2",
    '绿' => "lv4", '蓝' => "lan2", '黄' => "huang2", '黑' => "hei1",
    '男' => "nan2", '孩' => "hai2", '妈' => "ma1", '爸' => "ba4",
    '哥' => "ge1", '姐' => "jie3", '弟' => "di4", '妹' => "mei4",
    '今' => "jin1", '昨' => "zuo2", '界' => "jie4", '技' => "ji4",
    '术' => "shu4", '脑' => "nao3", '网' => "wang3", '络' => "luo4",
    '欢' => "huan1", '台' => "tai2", '湾' => "wan1", '阳' => "yang2",
    '解' => "jie3",
};

/// Phrases whose readings differ from the per-character defaults
static PHRASE_PINYIN: phf::Map<&'static str, &'static str> = phf_map! {
    "银行" => "yin2 hang2",
    "行走" => "xing2 zou3",
    "行人" => "xing2 ren2",
    "长大" => "zhang3 da4",
    "长城" => "chang2 cheng2",
    "音乐" => "yin1 yue4",
    "快乐" => "kuai4 le4",
    "重要" => "zhong4 yao4",
    "重新" => "chong2 xin1",
    "朝阳" => "zhao1 yang2",
    "觉得" => "jue2 de5",
    "睡觉" => "shui4 jiao4",
    "中国" => "zhong1 guo2",
    "种子" => "zhong3 zi5",
    "地方" => "di4 fang5",
    "东西" => "dong1 xi5",
    "朋友" => "peng2 you5",
    "得到" => "de2 dao4",
    "了解" => "liao3 jie3",
    "还是" => "hai2 shi4",
    "还钱" => "huan2 qian2",
    "都市" => "du1 shi4",
    "和平" => "he2 ping2",
};

#[rustfmt::skip]
static TRADITIONAL_TO_SIMPLIFIED: phf::Map<char, char> = phf_map! {
    '們' => '们', '個' => '个', '來' => '来', '說' => '说', '國' => '国', '時' => '时',
    '會' => '会', '對' => '对', '發' => '发', '過' => '过', '還' => '还', '學' => '学',
    '後' => '后', '沒' => '没', '開' => '开', '見' => '见', '經' => '经', '頭' => '头',
    '現' => '现', '樣' => '样', '長' => '长', '兩' => '两', '動' => '动', '從' => '从',
    '進' => '进', '實' => '实', '點' => '点', '種' => '种', '聲' => '声', '話' => '话',
    '兒' => '儿', '問' => '问', '機' => '机', '給' => '给', '間' => '间', '電' => '电',
    '門' => '门', '氣' => '气', '聽' => '听', '無' => '无', '書' => '书', '車' => '车',
    '馬' => '马', '報' => '报', '師' => '师', '場' => '场', '語' => '语', '誰' => '谁',
    '嗎' => '吗', '謝' => '谢', '請' => '请', '愛' => '爱', '樂' => '乐', '買' => '买',
    '賣' => '卖', '讀' => '读', '寫' => '写', '歡' => '欢', '臺' => '台', '灣' => '湾',
    '網' => '网', '絡' => '络', '腦' => '脑', '鳥' => '鸟', '魚' => '鱼', '紅' => '红',
    '綠' => '绿', '藍' => '蓝', '黃' => '黄', '媽' => '妈', '風' => '风', '雲' => '云',
    '術' => '术', '錢' => '钱', '銀' => '银', '東' => '东', '業' => '业', '萬' => '万',
    '蘋' => '苹', '貓' => '猫', '覺' => '觉', '華' => '华', '張' => '张', '難' => '难',
    '數' => '数', '員' => '员', '總' => '总', '處' => '处', '應' => '应', '裡' => '里',
    '麼' => '么', '將' => '将', '關' => '关', '為' => '为', '與' => '与', '這' => '这',
};

/// One Han character's reading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Syllable {
    pub hanzi: char,
    /// Toneless pinyin (`hao`)
    pub base: String,
    /// 1-4, or 5 for the neutral tone
    pub tone: u8,
}

/// Split a numbered pinyin syllable (`hao3` → `("hao", 3)`)
///
/// A missing tone digit means the neutral tone.
pub fn split_tone(pinyin: &str) -> (String, u8) {
    let pinyin = pinyin.trim().to_lowercase();
    match pinyin.chars().last().and_then(|c| c.to_digit(10)) {
        Some(tone @ 1..=5) => (pinyin[..pinyin.len() - 1].to_string(), tone as u8),
        Some(_) => (pinyin[..pinyin.len() - 1].to_string(), NEUTRAL_TONE),
        None => (pinyin, NEUTRAL_TONE),
    }
}

/// Simplified form of a traditional character, or the character itself
pub fn to_simplified(c: char) -> char {
    TRADITIONAL_TO_SIMPLIFIED.get(&c).copied().unwrap_or(c)
}

/// Apply Mandarin tone sandhi in place
///
/// - 不 before a fourth tone reads bu2
/// - 一 before a fourth tone reads yi2, before tones 1-3 yi4
/// - a third tone before another third tone reads as a second tone
pub fn apply_sandhi(syllables: &mut [Syllable]) {
    let original: Vec<u8> = syllables.iter().map(|s| s.tone).collect();
    for i in 0..syllables.len().saturating_sub(1) {
        let next = original[i + 1];
        let syllable = &mut syllables[i];
        match syllable.hanzi {
            '不' if next == 4 => syllable.tone = 2,
            '一' if next == 4 => syllable.tone = 2,
            '一' if (1..=3).contains(&next) => syllable.tone = 4,
            _ if original[i] == 3 && next == 3 => syllable.tone = 2,
            _ => {}
        }
    }
}

/// Character and phrase readings
#[derive(Debug, Clone, Default)]
pub struct PinyinTable {
    chars: HashMap<char, Vec<String>>,
    phrases: HashMap<String, Vec<String>>,
    max_phrase_chars: usize,
}

impl PinyinTable {
    /// Table over the built-in readings
    pub fn builtin() -> Self {
        let mut table = Self::default();
        for (c, readings) in CHAR_PINYIN.entries() {
            table.insert_char(*c, readings.split(',').map(String::from).collect());
        }
        for (phrase, syllables) in PHRASE_PINYIN.entries() {
            table.insert_phrase(phrase, syllables.split_whitespace().map(String::from).collect());
        }
        table
    }

    pub fn insert_char(&mut self, c: char, readings: Vec<String>) {
        if !readings.is_empty() {
            self.chars.insert(c, readings);
        }
    }

    /// Add a phrase; ignored unless there is one syllable per character
    pub fn insert_phrase(&mut self, phrase: &str, syllables: Vec<String>) -> bool {
        let count = phrase.chars().count();
        if count < 2 || count != syllables.len() {
            return false;
        }
        self.max_phrase_chars = self.max_phrase_chars.max(count);
        self.phrases.insert(phrase.to_string(), syllables);
        true
    }

    /// All readings of a character, default first
    pub fn readings(&self, c: char) -> Option<&[String]> {
        self.chars.get(&to_simplified(c)).map(Vec::as_slice)
    }

    pub fn contains(&self, c: char) -> bool {
        self.chars.contains_key(&to_simplified(c))
    }

    pub fn char_count(&self) -> usize {
        self.chars.len()
    }

    pub fn phrase_count(&self) -> usize {
        self.phrases.len()
    }

    /// Merge entries from a file
    ///
    /// Lines are `<char> <pinyin1>[,<pinyin2>...]` for characters and
    /// `<phrase> <pinyin1>,<pinyin2>...` (one syllable per character) for
    /// phrases. `#` starts a comment line.
    pub fn load(&mut self, path: &Path) -> PhonemizerResult<usize> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            PhonemizerError::Dictionary(format!("Failed to read {}: {e}", path.display()))
        })?;
        Ok(self.load_from_str(&contents))
    }

    pub fn load_from_str(&mut self, contents: &str) -> usize {
        let mut added = 0;
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, rest)) = line.split_once(char::is_whitespace) else {
                continue;
            };
            let readings: Vec<String> = rest
                .split([',', ' ', '\t'])
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_lowercase)
                .collect();

            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if !readings.is_empty() => {
                    self.insert_char(c, readings);
                    added += 1;
                }
                (Some(_), Some(_)) => {
                    if self.insert_phrase(key, readings) {
                        added += 1;
                    }
                }
                _ => {}
            }
        }
        added
    }

    /// Read a run of Han characters, phrases first
    ///
    /// Characters without a reading are skipped.
    pub fn convert(&self, run: &[char]) -> Vec<Syllable> {
        let simplified: Vec<char> = run.iter().map(|c| to_simplified(*c)).collect();
        let mut syllables = Vec::with_capacity(simplified.len());
        let mut i = 0;

        'outer: while i < simplified.len() {
            let longest = self.max_phrase_chars.min(simplified.len() - i);
            for len in (2..=longest).rev() {
                let phrase: String = simplified[i..i + len].iter().collect();
                if let Some(readings) = self.phrases.get(&phrase) {
                    for (c, reading) in simplified[i..i + len].iter().zip(readings) {
                        let (base, tone) = split_tone(reading);
                        syllables.push(Syllable { hanzi: *c, base, tone });
                    }
                    i += len;
                    continue 'outer;
                }
            }

            let c = simplified[i];
            match self.chars.get(&c).and_then(|r| r.first()) {
                Some(reading) => {
                    let (base, tone) = split_tone(reading);
                    syllables.push(Syllable { hanzi: c, base, tone });
                }
                None => tracing::debug!(character = %c, "No pinyin for character"),
            }
            i += 1;
        }
        syllables
    }
}
