//! 故事生成管道
//!
//! 给定一个 `StoryRequest`，产出单条有序事件流：
//!
//! 1. 文本生成（单次阻塞调用）。失败时发出唯一一个 `error` 事件并终止，不重试
//! 2. 发出 `story` 事件（全部场景，仅文本）
//! 3. 开启风格一致性时，主参考图（高保真模型）作为独立任务生成一次；
//!    场景任务立即启动，只有场景的图片调用等待主图结果作为条件，
//!    音频合成不被主图阻塞
//! 4. 每个场景一个任务，图片 + 音频并发生成；任务总并发受 Semaphore 限制，
//!    结果经 mpsc 通道扇入，按完成顺序发出 `scene` 事件
//! 5. 全部场景处理完后发出唯一一个 `complete`
//!
//! 单场景失败只降级该场景（字段为 null 或整场景跳过），不影响其他场景。
//! 客户端断开时输出流被丢弃，通道接收端随之关闭，在途任务发送失败即放弃
//! （尽力而为，不保证取消已发出的上游请求）。

use crate::models::{Scene, Story, StoryRequest};
use crate::providers::{ImageProvider, SpeechProvider, StyleReference, TextProvider};
use crate::stream::events::StoryStreamEvent;
use futures::future::{BoxFuture, FutureExt, Shared};
use futures::Stream;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

/// 主风格图结果的共享句柄：生成失败或未开启一致性时解析为 None
type SharedStyleRef = Shared<BoxFuture<'static, Option<Arc<StyleReference>>>>;

/// 故事生成管道
///
/// 唯一的状态是单次 `run` 内部的 Story 累加器；
/// 管道本身只持有不可变的 Provider 句柄，可安全地被并发请求共享。
pub struct StoryPipeline {
    text: Arc<dyn TextProvider>,
    image: Arc<dyn ImageProvider>,
    speech: Arc<dyn SpeechProvider>,
    scene_concurrency: usize,
}

impl StoryPipeline {
    pub fn new(
        text: Arc<dyn TextProvider>,
        image: Arc<dyn ImageProvider>,
        speech: Arc<dyn SpeechProvider>,
        scene_concurrency: usize,
    ) -> Self {
        Self {
            text,
            image,
            speech,
            scene_concurrency: scene_concurrency.max(1),
        }
    }

    /// 执行一次生成，返回事件流
    ///
    /// 每次调用产生独立的流，请求之间不共享可变状态。
    pub fn run(
        &self,
        request: StoryRequest,
    ) -> impl Stream<Item = StoryStreamEvent> + Send + 'static {
        let text = self.text.clone();
        let image = self.image.clone();
        let speech = self.speech.clone();
        let limit = self.scene_concurrency;

        async_stream::stream! {
            let request = request.normalized();
            tracing::info!(
                "[PIPELINE] 开始生成: {} 场景, style={}, consistency={}",
                request.num_images,
                request.style,
                request.use_style_consistency
            );

            // 1. 文本生成，失败即整体失败
            let texts = match text
                .generate_story(&request.prompt, &request.style, request.num_images)
                .await
            {
                Ok(texts) => texts,
                Err(e) => {
                    tracing::error!("[PIPELINE] 文本生成失败: {}", e);
                    yield StoryStreamEvent::Error {
                        message: format!("story generation failed: {e}"),
                    };
                    return;
                }
            };

            // 2. 先把纯文本故事推给客户端
            let mut story = Story::from_texts(texts);
            yield StoryStreamEvent::Story { story: story.clone() };

            // 3. 主风格参考图独立任务：场景任务立即启动，
            //    只有图片调用等待主图结果，音频合成不被它阻塞。
            //    主图失败只降级为独立生成，不终止流
            let master_style: SharedStyleRef = if request.use_style_consistency {
                let image = image.clone();
                let prompt = request.prompt.clone();
                let style = request.style.clone();
                let handle = tokio::spawn(async move {
                    match image.generate_style_image(&prompt, &style).await {
                        Ok(reference) => Some(Arc::new(reference)),
                        Err(e) => {
                            tracing::warn!("[PIPELINE] 主风格图生成失败，退化为独立生成: {}", e);
                            None
                        }
                    }
                });
                async move { handle.await.unwrap_or(None) }.boxed().shared()
            } else {
                async { None }.boxed().shared()
            };

            // 4. 场景扇出
            let semaphore = Arc::new(Semaphore::new(limit));
            let (tx, mut rx) = mpsc::channel::<Scene>(story.len().max(1));

            for scene in story.scenes.clone() {
                let image = image.clone();
                let speech = speech.clone();
                let master_style = master_style.clone();
                let semaphore = semaphore.clone();
                let tx = tx.clone();
                let style = request.style.clone();
                let voice = request.voice.clone();

                tokio::spawn(async move {
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => return,
                    };

                    let mut scene = scene;
                    let image_call = async {
                        let style_ref = master_style.await;
                        image
                            .generate_scene_image(&scene.text, &style, style_ref.as_deref())
                            .await
                    };
                    let (image_result, audio_result) =
                        tokio::join!(image_call, speech.synthesize(&scene.text, &voice));

                    match image_result {
                        Ok(url) => scene.image_url = Some(url),
                        Err(e) => {
                            tracing::warn!("[PIPELINE] 场景 {} 图片失败: {}", scene.index, e);
                        }
                    }
                    match audio_result {
                        Ok(url) => scene.audio_url = Some(url),
                        Err(e) => {
                            tracing::warn!("[PIPELINE] 场景 {} 音频失败: {}", scene.index, e);
                        }
                    }

                    // 两项都失败的场景直接跳过；只失败一项的降级发出
                    if !scene.has_media() {
                        tracing::warn!("[PIPELINE] 场景 {} 无任何媒体，跳过", scene.index);
                        return;
                    }

                    // 接收端已关闭说明客户端断开，放弃结果即可
                    let _ = tx.send(scene).await;
                });
            }
            drop(tx);

            // 5. 按完成顺序扇入并发出
            while let Some(scene) = rx.recv().await {
                if let Some(slot) = story.scenes.get_mut(scene.index) {
                    *slot = scene.clone();
                }
                yield StoryStreamEvent::Scene { scene };
            }

            tracing::info!("[PIPELINE] 生成完成");
            yield StoryStreamEvent::Complete;
        }
    }
}
