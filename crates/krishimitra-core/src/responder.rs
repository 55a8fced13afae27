//! Keyword-triggered canned replies in English and Hindi.
//!
//! The responder walks an ordered list of rules and answers with the reply of
//! the first rule whose trigger phrase occurs in the message, compared without
//! regard to case. Messages that match nothing get a fixed fallback.

use std::borrow::Cow;

use krishimitra_types::Language;

/// A text available in every supported language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Localized {
    pub en: Cow<'static, str>,
    pub hi: Cow<'static, str>,
}

impl Localized {
    /// Build from static strings.
    pub const fn new(en: &'static str, hi: &'static str) -> Self {
        Self {
            en: Cow::Borrowed(en),
            hi: Cow::Borrowed(hi),
        }
    }

    /// The text for `language`.
    pub fn get(&self, language: Language) -> &str {
        match language {
            Language::Hindi => &self.hi,
            _ => &self.en,
        }
    }
}

/// One trigger phrase and its reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    trigger: Cow<'static, str>,
    needle: String,
    reply: Localized,
}

impl Rule {
    /// Create a rule. The trigger is matched case-insensitively.
    pub fn new(trigger: impl Into<Cow<'static, str>>, reply: Localized) -> Self {
        let trigger = trigger.into();
        let needle = trigger.to_lowercase();
        Self {
            trigger,
            needle,
            reply,
        }
    }

    /// The trigger phrase as written.
    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    /// The localized reply.
    pub fn reply(&self) -> &Localized {
        &self.reply
    }

    fn matches(&self, lowered_input: &str) -> bool {
        !self.needle.is_empty() && lowered_input.contains(&self.needle)
    }
}

const WHEAT_FERTILIZER: Localized = Localized::new(
    "For wheat cultivation, a balanced NPK fertilizer (like 20-20-20) is recommended during land preparation. Apply nitrogen-rich fertilizer like urea (46-0-0) during the tillering stage. For optimal results, incorporate organic matter and use soil testing to determine specific needs for your field.",
    "गेहूं की खेती के लिए, भूमि तैयारी के दौरान संतुलित NPK उर्वरक (जैसे 20-20-20) की सिफारिश की जाती है। टिलरिंग चरण के दौरान यूरिया (46-0-0) जैसे नाइट्रोजन युक्त उर्वरक का प्रयोग करें। सर्वोत्तम परिणामों के लिए, जैविक पदार्थ मिलाएं और अपने खेत की विशिष्ट आवश्यकताओं को निर्धारित करने के लिए मिट्टी परीक्षण का उपयोग करें।",
);

const STEM_BORER: Localized = Localized::new(
    "To control stem borers in crops: 1) Use pheromone traps to monitor pest populations. 2) Apply neem-based insecticides as they are eco-friendly. 3) For severe infestations, consider systemic insecticides like Chlorantraniliprole or Flubendiamide. 4) Practice crop rotation and maintain field hygiene by removing crop residues after harvesting.",
    "फसलों में तना छेदक को नियंत्रित करने के लिए: 1) कीट आबादी की निगरानी के लिए फेरोमोन ट्रैप का उपयोग करें। 2) नीम-आधारित कीटनाशकों का प्रयोग करें क्योंकि वे पर्यावरण के अनुकूल हैं। 3) गंभीर संक्रमण के लिए, क्लोरांट्रानिलिप्रोल या फ्लुबेंडिअमाइड जैसे प्रणालीगत कीटनाशकों पर विचार करें। 4) फसल चक्र का अभ्यास करें और फसल कटाई के बाद फसल अवशेषों को हटाकर खेत की स्वच्छता बनाए रखें।",
);

const POLYHOUSE_SUBSIDY: Localized = Localized::new(
    "The Government of India offers subsidies for polyhouse construction under the National Horticulture Mission. Small and marginal farmers can receive up to 50% subsidy, while other farmers get up to 40%. The maximum subsidy is capped at ₹32,000 per 500 sq.m. Apply through your district horticulture office with land documents, bank statements, and a detailed project report.",
    "भारत सरकार राष्ट्रीय बागवानी मिशन के तहत पॉलीहाउस निर्माण के लिए सब्सिडी प्रदान करती है। छोटे और सीमांत किसानों को 50% तक सब्सिडी मिल सकती है, जबकि अन्य किसानों को 40% तक मिलती है। अधिकतम सब्सिडी 500 वर्ग मीटर प्रति ₹32,000 तक सीमित है। भूमि दस्तावेजों, बैंक स्टेटमेंट और विस्तृत परियोजना रिपोर्ट के साथ अपने जिला बागवानी कार्यालय के माध्यम से आवेदन करें।",
);

/// Reply used when no trigger matches.
pub const FALLBACK: Localized = Localized::new(
    "I don't have specific information about that query yet. Please ask about wheat fertilizers, stem borer treatment, or polyhouse subsidies for detailed answers.",
    "मुझे अभी तक इस प्रश्न के बारे में विशिष्ट जानकारी नहीं है। कृपया विस्तृत उत्तरों के लिए गेहूं के उर्वरकों, तना छेदक उपचार, या पॉलीहाउस सब्सिडी के बारे में पूछें।",
);

/// Opening bot turn of every conversation.
pub const GREETING: Localized = Localized::new(
    "Hello! I am KrishiMitra AI, your agricultural assistant. How can I help you today?",
    "नमस्ते! मैं कृषिमित्र AI हूँ, आपका कृषि सहायक। आज मैं आपकी कैसे मदद कर सकता हूँ?",
);

/// Ordered rule table with fallback and greeting texts.
#[derive(Debug, Clone)]
pub struct KeywordResponder {
    rules: Vec<Rule>,
    fallback: Localized,
    greeting: Localized,
}

impl Default for KeywordResponder {
    fn default() -> Self {
        Self::builtin()
    }
}

impl KeywordResponder {
    /// The built-in agricultural question set.
    pub fn builtin() -> Self {
        Self::new(vec![
            Rule::new("Best fertilizer for wheat?", WHEAT_FERTILIZER),
            Rule::new("How to treat stem borer?", STEM_BORER),
            Rule::new("Subsidy for polyhouse?", POLYHOUSE_SUBSIDY),
        ])
    }

    /// A responder with custom rules and the standard fallback and greeting.
    ///
    /// Rules are tried in the order given.
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            rules,
            fallback: FALLBACK,
            greeting: GREETING,
        }
    }

    /// Replace the fallback reply.
    #[must_use]
    pub fn with_fallback(mut self, fallback: Localized) -> Self {
        self.fallback = fallback;
        self
    }

    /// Replace the greeting.
    #[must_use]
    pub fn with_greeting(mut self, greeting: Localized) -> Self {
        self.greeting = greeting;
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// The first rule whose trigger occurs in `input`.
    pub fn matching_rule(&self, input: &str) -> Option<&Rule> {
        let lowered = input.to_lowercase();
        self.rules.iter().find(|rule| rule.matches(&lowered))
    }

    /// Reply to `input` in `language`.
    ///
    /// ```
    /// use krishimitra_core::KeywordResponder;
    /// use krishimitra_types::Language;
    ///
    /// let responder = KeywordResponder::builtin();
    /// let reply = responder.reply("how to treat STEM BORER?", Language::English);
    /// assert!(reply.starts_with("To control stem borers"));
    /// ```
    pub fn reply(&self, input: &str, language: Language) -> &str {
        match self.matching_rule(input) {
            Some(rule) => rule.reply.get(language),
            None => self.fallback.get(language),
        }
    }

    /// Trigger phrases offered as follow-up questions, in rule order.
    pub fn suggestions(&self) -> Vec<&str> {
        self.rules.iter().map(Rule::trigger).collect()
    }

    pub fn greeting(&self, language: Language) -> &str {
        self.greeting.get(language)
    }

    pub fn fallback(&self, language: Language) -> &str {
        self.fallback.get(language)
    }
}
