//! Turning an uploaded image into a text-to-image prompt.

use super::types::{ChatMessage, ContentPart};

/// Instruction sent alongside the image. Asks for a bare, detailed Chinese prompt.
pub const ANALYSIS_INSTRUCTION: &str = "请仔细分析这张图片的所有细节，然后直接输出一个用于 AI 图片生成的详细提示词。

要求：
1. 直接输出提示词内容，不要任何前缀、解释或额外说明
2. 描述要详细具体，包括：主体、风格、颜色、构图、光线、质感等
3. 使用中文输出

现在请直接输出提示词：";

/// Returned when the model produces no text.
pub const FALLBACK_PROMPT: &str = "无法生成提示词";

/// Boilerplate lead-ins models tend to add despite the instruction. Checked in order.
pub const BOILERPLATE_PREFIXES: &[&str] = &[
    "根据图片，",
    "这张图片",
    "图片显示",
    "提示词：",
    "提示词:",
    "Prompt:",
    "Prompt：",
    "生成提示词：",
    "以下是提示词：",
    "我生成的提示词是：",
    "这是提示词：",
];

/// Build the single user message for an analysis call.
pub fn analysis_message(image_base64: &str) -> ChatMessage {
    ChatMessage::user(vec![
        ContentPart::text(ANALYSIS_INSTRUCTION),
        ContentPart::image(format!("data:image/jpeg;base64,{image_base64}"), None),
    ])
}

/// Strip known lead-ins, then one leading and one trailing quote.
///
/// Each prefix is tested once, in list order, against the text left by the
/// previous step.
pub fn clean_prompt(raw: &str) -> String {
    let mut prompt = raw;
    for prefix in BOILERPLATE_PREFIXES {
        if let Some(rest) = prompt.strip_prefix(prefix) {
            prompt = rest.trim();
        }
    }

    let prompt = prompt
        .strip_prefix(['"', '\''])
        .unwrap_or(prompt);
    let prompt = prompt
        .strip_suffix(['"', '\''])
        .unwrap_or(prompt);
    prompt.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::MessageContent;

    #[test]
    fn strips_single_prefix() {
        assert_eq!(clean_prompt("提示词：一只橘猫趴在窗台上"), "一只橘猫趴在窗台上");
        assert_eq!(clean_prompt("Prompt: a red fox in snow"), "a red fox in snow");
    }

    #[test]
    fn strips_chained_prefixes_in_list_order() {
        assert_eq!(
            clean_prompt("根据图片， 这张图片 提示词：夕阳下的海边"),
            "夕阳下的海边"
        );
    }

    #[test]
    fn prefix_later_in_list_does_not_reenable_earlier_ones() {
        // "提示词：" is checked before "这是提示词：", so it survives here.
        assert_eq!(clean_prompt("这是提示词：提示词：山"), "提示词：山");
    }

    #[test]
    fn strips_surrounding_quotes() {
        assert_eq!(clean_prompt("\"a misty forest\""), "a misty forest");
        assert_eq!(clean_prompt("'a misty forest'"), "a misty forest");
        assert_eq!(clean_prompt("Prompt: \"星空下的城市\" "), "星空下的城市");
    }

    #[test]
    fn leaves_clean_text_alone() {
        assert_eq!(clean_prompt("水彩风格的樱花小路"), "水彩风格的樱花小路");
        assert_eq!(clean_prompt("  padded  "), "padded");
    }

    #[test]
    fn analysis_message_embeds_jpeg_data_uri() {
        let msg = analysis_message("QUJD");
        let MessageContent::Parts(parts) = msg.content else {
            panic!("expected multimodal content");
        };
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], ContentPart::text(ANALYSIS_INSTRUCTION));
        assert_eq!(parts[1], ContentPart::image("data:image/jpeg;base64,QUJD", None));
    }
}
