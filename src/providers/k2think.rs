//! K2 Think 文本生成 Provider
//!
//! OpenAI 兼容的 chat completions 接口。模型输出带 "Page N:" 标签的故事文本，
//! 推理类模型会在正文前输出思考过程，所以从最后一次出现的 "Page 1:" 截取，
//! 再按页标签切分为场景。可选的润色增强是第二次外部调用，在切分前执行。

use crate::config::TextConfig;
use crate::error::ProviderError;
use crate::providers::traits::{ProviderResult, TextProvider};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde_json::json;
use std::sync::OnceLock;
use std::time::Duration;

const STORY_SYSTEM_PROMPT: &str = "\
You are a professional children's storybook writer with 20 years of experience writing for children ages 4-8.
Write a whimsical, gentle, and encouraging children's storybook with the following requirements:
- Exactly {num_pages} pages total.
- Each page contains 1-2 short sentences.
- Clear beginning, middle, and end.
- Light rhyming throughout.
- Easy to read aloud.
- Focus on ONE clear child-friendly lesson.

Formatting rules:
- Label each section as \"Page 1:\", \"Page 2:\", etc.
- The output must begin with \"Page 1:\" and end with the final page.
- No text is allowed before or after the story.

Restrictions:
- Do NOT include explanations, analysis, reasoning, planning, or commentary.
- Do NOT mention being an AI or following instructions.
- Output ONLY the story text.";

const ENHANCE_SYSTEM_PROMPT: &str = "\
You are an editor polishing a children's storybook. Improve rhythm, word choice \
and read-aloud flow while keeping every \"Page N:\" label, the page count and \
the story's meaning unchanged. Output ONLY the revised story text.";

/// K2 Think Provider
pub struct K2ThinkProvider {
    config: TextConfig,
    client: Client,
}

impl K2ThinkProvider {
    pub fn new(config: TextConfig) -> Self {
        // 带超时配置的 HTTP 客户端，推理模型响应较慢，总超时放宽到 5 分钟
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(300))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { config, client }
    }

    fn chat_url(&self) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        if base.ends_with("/v1") {
            format!("{}/chat/completions", base)
        } else {
            format!("{}/v1/chat/completions", base)
        }
    }

    /// 单次 chat completions 调用，返回首个 choice 的文本
    async fn call_chat(&self, system: &str, user: &str) -> ProviderResult<String> {
        let payload = json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "stream": false,
        });

        let response = self
            .client
            .post(self.chat_url())
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("[TEXT] 上游返回 {}: {}", status, truncate(&body, 300));
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: truncate(&body, 300),
            });
        }

        let body: serde_json::Value = response.json().await?;
        body["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                ProviderError::InvalidResponse("响应缺少 choices[0].message.content".to_string())
            })
    }

    /// 润色增强（第二次外部调用）
    async fn enhance(&self, story: &str) -> ProviderResult<String> {
        self.call_chat(ENHANCE_SYSTEM_PROMPT, story).await
    }
}

#[async_trait]
impl TextProvider for K2ThinkProvider {
    async fn generate_story(
        &self,
        prompt: &str,
        style: &str,
        num_scenes: usize,
    ) -> ProviderResult<Vec<String>> {
        let system = STORY_SYSTEM_PROMPT.replace("{num_pages}", &num_scenes.to_string());
        let user = format!(
            "Write a {} style story centered around the following topic: \"{}\"",
            style, prompt
        );

        tracing::info!("[TEXT] 生成故事: {} 页", num_scenes);
        let raw = self.call_chat(&system, &user).await?;

        let mut story = extract_final_story(&raw)
            .ok_or_else(|| ProviderError::InvalidResponse("输出中没有 Page 1: 标签".to_string()))?
            .to_string();

        if self.config.enhance {
            match self.enhance(&story).await {
                Ok(polished) => {
                    // 润色后仍要求保留页标签，丢失时退回原文
                    match extract_final_story(&polished) {
                        Some(kept) => story = kept.to_string(),
                        None => {
                            tracing::warn!("[TEXT] 润色结果丢失页标签，保留原始输出");
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("[TEXT] 润色调用失败，保留原始输出: {}", e);
                }
            }
        }

        let pages = split_pages(&story, num_scenes);
        if pages.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(pages)
    }
}

fn page_one_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Page\s*1:").expect("static regex"))
}

fn page_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Page\s+(\d+):").expect("static regex"))
}

/// 从最后一次出现的 "Page 1:" 截取正式故事
///
/// 推理模型的思考过程可能包含草稿页标签，约定格式正确的故事在输出末尾。
pub fn extract_final_story(text: &str) -> Option<&str> {
    let last = page_one_regex().find_iter(text).last()?;
    Some(text[last.start()..].trim())
}

/// 按 "Page N:" 标签切分场景文本
///
/// 段内换行压成单个空格。页数多于请求数时截断；
/// 少于请求数时循环补齐，保证返回正好 `num_scenes` 段。
pub fn split_pages(story: &str, num_scenes: usize) -> Vec<String> {
    let labels: Vec<regex::Match> = page_regex().find_iter(story).collect();
    let mut pages: Vec<String> = labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let end = labels.get(i + 1).map_or(story.len(), |next| next.start());
            story[label.end()..end]
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|text| !text.is_empty())
        .collect();

    if pages.is_empty() {
        return pages;
    }

    if pages.len() > num_scenes {
        pages.truncate(num_scenes);
    } else {
        let mut i = 0;
        while pages.len() < num_scenes {
            pages.push(pages[i % pages.len()].clone());
            i += 1;
        }
    }
    pages
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
