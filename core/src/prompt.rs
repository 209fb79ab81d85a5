//! Prompt assembly for the decision call and the visualization follow-up.

use crate::tools::ToolKind;

/// Build the decision system prompt for the configured tool set.
///
/// The contract is strict: a tool request or a visualization must come back
/// as a single clean JSON object, anything else is treated as a direct
/// answer.
pub fn decision_prompt(tools: &[ToolKind]) -> String {
    let mut tool_lines = String::new();
    for kind in tools {
        let line = match kind {
            ToolKind::Search => "* `search`: For general web searches, current events, facts.\n",
            ToolKind::Wikipedia => "* `wikipedia`: For in-depth factual information.\n",
            ToolKind::Arxiv => "* `arxiv`: For scientific papers and preprints.\n",
            ToolKind::Books => "* `books`: For book lookups on Open Library.\n",
            ToolKind::Github => "* `github`: For code repositories.\n",
            ToolKind::Stack => "* `stack`: For programming questions and answers.\n",
            ToolKind::Map => "* `map`: For places and locations.\n",
        };
        tool_lines.push_str(line);
    }

    format!(
        "You are Nova, a sophisticated and helpful AI assistant. Your primary goal is to provide direct, accurate, and intelligent responses. You have access to a variety of tools, but you should only use them when necessary.\n\n\
**Core Principles:**\n\
1.  **Prioritize Direct Answers:** For general knowledge, creative tasks, or coding, answer directly.\n\
2.  **Intelligent Tool Usage:** Only use tools for recent or real-time information (e.g., weather, news, sports scores).\n\
3.  **Graceful Fallbacks:** If a tool fails, say 'I'm sorry, I was unable to retrieve that information.'\n\n\
**Tool Selection:**\n\
* If a tool is needed, you MUST respond ONLY with a single, clean JSON object: `{{\"tool\": \"<tool_name>\", \"query\": \"<search_query>\"}}`.\n\n\
**Available Tools:**\n\
{tool_lines}\n\
**Visualizations:**\n\
* When you are given data and asked to chart, graph, or tabulate it, you MUST respond ONLY with a single JSON object of the form `{{\"type\": \"chart\", ...}}` or `{{\"type\": \"table\", ...}}` describing the visualization.\n\n\
**Answering based on Tool Results:**\n\
* When you are given data from a tool, you MUST use that data to answer the user's original question in a natural, conversational way. Do not mention the tool or the data source unless it's relevant. Synthesize the information into a final answer."
    )
}

/// Rewrite the user prompt for the second turn of the two-step
/// visualization protocol.
pub fn visualization_prompt(original: &str, context: &str) -> String {
    format!("Based on the following data, fulfill: '{original}'\n\nData:\n{context}")
}
