//! Built-in knowledge base: the last free stage, always answers.

use async_trait::async_trait;

use super::{SearchBackend, SearchError, SearchResult};

type Entry = (&'static str, &'static str, &'static str);

const IBM: &[Entry] = &[
    (
        "IBM - Official Website",
        "https://www.ibm.com",
        "IBM is a multinational technology corporation headquartered in Armonk, New York. Founded in 1911, IBM is one of the world's largest technology and consulting employers, with operations in over 175 countries.",
    ),
    (
        "IBM Stock Price and Financial Data",
        "https://finance.yahoo.com/quote/IBM",
        "Real-time IBM stock price, financial news, and analysis. IBM (International Business Machines Corporation) trades on NYSE under ticker symbol IBM.",
    ),
    (
        "IBM AI and Watson Platform",
        "https://www.ibm.com/watson",
        "IBM Watson is a suite of enterprise-ready AI services, applications and tooling designed to help organizations make better decisions by automating complex processes.",
    ),
    (
        "IBM Cloud and Red Hat Solutions",
        "https://www.ibm.com/cloud",
        "IBM Cloud offers a comprehensive hybrid cloud platform with AI-powered services, enterprise-grade security, and Red Hat OpenShift integration.",
    ),
    (
        "IBM Research and Innovation",
        "https://research.ibm.com",
        "IBM Research is IBM's innovation engine, exploring emerging technologies in AI, quantum computing, hybrid cloud, and scientific computing.",
    ),
];

const ARTIFICIAL_INTELLIGENCE: &[Entry] = &[
    (
        "What is Artificial Intelligence (AI)? | IBM",
        "https://www.ibm.com/topics/artificial-intelligence",
        "Artificial intelligence leverages computers and machines to mimic the problem-solving and decision-making capabilities of the human mind.",
    ),
    (
        "AI News and Trends 2024",
        "https://www.technologyreview.com/topic/artificial-intelligence/",
        "Latest developments in artificial intelligence, including breakthroughs in machine learning, deep learning, and generative AI technologies.",
    ),
    (
        "OpenAI and ChatGPT",
        "https://openai.com",
        "OpenAI is an AI research laboratory consisting of the for-profit OpenAI LP and its parent company, the non-profit OpenAI Inc, known for GPT models.",
    ),
];

const QUANTUM_COMPUTING: &[Entry] = &[
    (
        "IBM Quantum Computing",
        "https://www.ibm.com/quantum",
        "IBM Quantum is a quantum computing platform that offers cloud-based access to quantum processors and quantum computing systems.",
    ),
    (
        "What is Quantum Computing?",
        "https://www.nature.com/subjects/quantum-information",
        "Quantum computing harnesses quantum mechanical phenomena to process information in fundamentally new ways, potentially solving complex problems exponentially faster.",
    ),
];

/// Topics are checked in this order; the first contained in the query wins.
const TOPICS: &[(&str, &[Entry])] = &[
    ("ibm", IBM),
    ("artificial intelligence", ARTIFICIAL_INTELLIGENCE),
    ("quantum computing", QUANTUM_COMPUTING),
];

pub struct KnowledgeBase;

impl KnowledgeBase {
    pub fn lookup(query: &str, num_results: usize) -> Vec<SearchResult> {
        let lower = query.to_lowercase();

        if let Some((_, entries)) = TOPICS.iter().find(|(topic, _)| lower.contains(topic)) {
            return entries
                .iter()
                .take(num_results)
                .map(|(title, link, snippet)| SearchResult::new(*title, *link, *snippet))
                .collect();
        }

        let encoded = urlencoding::encode(query);
        vec![
            SearchResult::new(
                format!("{query} - Overview and Information"),
                format!("https://en.wikipedia.org/wiki/{encoded}"),
                format!("Comprehensive information and overview about {query}. This result provides general knowledge and context about the topic you're searching for."),
            ),
            SearchResult::new(
                format!("{query} - Latest News and Updates"),
                format!("https://news.google.com/search?q={encoded}"),
                format!("Recent news, developments, and updates related to {query}. Stay informed with the latest information and trends in this area."),
            ),
            SearchResult::new(
                format!("{query} - Research and Analysis"),
                format!("https://scholar.google.com/scholar?q={encoded}"),
                format!("Academic research, studies, and detailed analysis of {query}. Explore scholarly articles and expert opinions on this topic."),
            ),
        ]
        .into_iter()
        .take(num_results)
        .collect()
    }
}

#[async_trait]
impl SearchBackend for KnowledgeBase {
    fn name(&self) -> &str {
        "knowledge_base"
    }

    fn source(&self) -> Option<&str> {
        Some("Knowledge Base")
    }

    async fn search(
        &self,
        query: &str,
        num_results: usize,
    ) -> std::result::Result<Vec<SearchResult>, SearchError> {
        Ok(Self::lookup(query, num_results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topics_checked_in_order() {
        // Contains both "ibm" and "quantum computing"; ibm comes first
        let results = KnowledgeBase::lookup("IBM quantum computing", 5);
        assert_eq!(results.len(), 5);
        assert_eq!(results[0].title, "IBM - Official Website");

        let results = KnowledgeBase::lookup("what is quantum computing", 5);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].link, "https://www.ibm.com/quantum");
    }

    #[test]
    fn generic_links_are_encoded() {
        let results = KnowledgeBase::lookup("tide pools", 2);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].link, "https://en.wikipedia.org/wiki/tide%20pools");
        assert_eq!(results[1].title, "tide pools - Latest News and Updates");
    }
}
