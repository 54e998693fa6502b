//! Deterministic results used when every other stage has failed.

use super::SearchResult;

type Entry = (&'static str, &'static str, &'static str);

const IBM: &[Entry] = &[
    (
        "IBM - Official Website | Leading AI, Cloud & Data Solutions",
        "https://www.ibm.com",
        "IBM is a leading cloud platform and cognitive solutions company. Founded in 1911, IBM has evolved from a hardware manufacturer to a global technology and consulting organization focused on AI, hybrid cloud, and enterprise solutions.",
    ),
    (
        "IBM's AI Strategy: Watson and watsonx Platform 2024",
        "https://ibm.com/ai",
        "IBM's watsonx platform represents the next generation of AI for business. Built on foundation models and designed for enterprises, watsonx helps organizations scale AI across their business with trust and transparency.",
    ),
    (
        "IBM Hybrid Cloud Strategy with Red Hat Integration",
        "https://ibm.com/cloud",
        "IBM's $34 billion acquisition of Red Hat has positioned the company as a leader in hybrid cloud solutions. The combined offering helps enterprises modernize applications and infrastructure across any cloud environment.",
    ),
    (
        "IBM Quantum Computing Breakthrough 2024",
        "https://ibm.com/quantum",
        "IBM continues to lead in quantum computing research with its latest 1000+ qubit processors. The company's quantum network includes over 200 institutions working on practical quantum applications for business and science.",
    ),
    (
        "IBM Stock Analysis and Financial Performance",
        "https://finance.example.com/ibm",
        "IBM (NYSE: IBM) reported strong growth in its cloud and AI segments in 2024. The company's transformation strategy shows promise with increasing revenue from software and consulting services.",
    ),
];

const AI: &[Entry] = &[
    (
        "Artificial Intelligence Trends 2024 - Latest Developments",
        "https://example.com/ai-trends",
        "The AI landscape in 2024 is dominated by large language models, generative AI applications, and enterprise AI adoption. Key players include OpenAI, Google, Microsoft, and IBM with their respective platforms.",
    ),
    (
        "Enterprise AI Implementation Best Practices",
        "https://example.com/enterprise-ai",
        "Organizations are rapidly adopting AI technologies for automation, decision-making, and customer experience enhancement. Key considerations include data governance, ethics, and integration challenges.",
    ),
    (
        "AI Market Size and Growth Projections",
        "https://example.com/ai-market",
        "The global AI market is expected to reach $1.8 trillion by 2030, driven by enterprise adoption, cloud AI services, and breakthrough applications in healthcare, finance, and manufacturing.",
    ),
];

const CLOUD: &[Entry] = &[
    (
        "Hybrid Cloud Solutions - Multi-Cloud Strategy Guide",
        "https://example.com/hybrid-cloud",
        "Hybrid cloud architectures enable organizations to leverage both public and private cloud resources. Leading providers include AWS, Microsoft Azure, Google Cloud, and IBM with Red Hat OpenShift.",
    ),
    (
        "Cloud Migration Best Practices for Enterprises",
        "https://example.com/cloud-migration",
        "Successful cloud migration requires careful planning, security considerations, and application modernization. Key factors include cost optimization, performance monitoring, and governance frameworks.",
    ),
    (
        "Cloud Computing Market Leaders 2024",
        "https://example.com/cloud-leaders",
        "Amazon Web Services maintains its market leadership, followed by Microsoft Azure and Google Cloud Platform. IBM's focus on hybrid cloud and Red Hat integration targets enterprise customers.",
    ),
];

fn table(entries: &[Entry], count: usize) -> Vec<SearchResult> {
    entries
        .iter()
        .take(count)
        .map(|(title, link, snippet)| SearchResult::new(*title, *link, *snippet))
        .collect()
}

/// Mock results keyed on the query: `ibm`, then `ai`, then `cloud`, else generic.
pub fn results(query: &str, count: usize) -> Vec<SearchResult> {
    let lower = query.to_lowercase();

    if lower.contains("ibm") {
        return table(IBM, count);
    }
    if lower.contains("ai") || lower.contains("artificial intelligence") {
        return table(AI, count);
    }
    if lower.contains("cloud") {
        return table(CLOUD, count);
    }

    vec![
        SearchResult::new(
            format!("Search Results for \"{query}\" - Information Overview"),
            "https://example.com/search1",
            format!("Comprehensive information about {query}. This demo result would contain relevant details and insights related to your search query in a real implementation."),
        ),
        SearchResult::new(
            format!("{query} - Latest News and Updates"),
            "https://example.com/search2",
            format!("Recent developments and news about {query}. Stay updated with the latest trends, announcements, and industry insights related to your topic of interest."),
        ),
        SearchResult::new(
            format!("{query} - Analysis and Expert Opinions"),
            "https://example.com/search3",
            format!("Expert analysis and professional opinions on {query}. Get insights from industry leaders and understand the implications and future outlook for this topic."),
        ),
    ]
    .into_iter()
    .take(count)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyed_tables() {
        assert_eq!(results("IBM news", 2).len(), 2);
        assert_eq!(results("AI chips", 5)[0].link, "https://example.com/ai-trends");
        assert_eq!(results("hybrid cloud", 5).len(), 3);
    }

    #[test]
    fn generic_results_mention_query() {
        let out = results("tea", 5);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].title, "Search Results for \"tea\" - Information Overview");
        assert!(out[2].snippet.contains("tea"));
    }

    #[test]
    fn repeated_calls_are_identical() {
        assert_eq!(results("anything at all", 3), results("anything at all", 3));
    }
}
