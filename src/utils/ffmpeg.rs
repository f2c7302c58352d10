use crate::core::config::VideoConfig;
use crate::services::video::{Clip, MediaBackend};
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use log::debug;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Codecs of the compatibility pass; independent of `video.video_codec`.
const REENCODE_VIDEO_CODEC: &str = "libx264";
const REENCODE_AUDIO_CODEC: &str = "aac";

/// `MediaBackend` that shells out to the `ffmpeg` and `ffprobe` binaries.
pub struct FfmpegBackend {
    ffmpeg: String,
    ffprobe: String,
    video_codec: String,
}

impl FfmpegBackend {
    pub fn new(config: &VideoConfig) -> Self {
        Self {
            ffmpeg: config.ffmpeg.clone(),
            ffprobe: config.ffprobe.clone(),
            video_codec: config.video_codec.clone(),
        }
    }

    async fn run(&self, program: &str, args: Vec<OsString>) -> Result<String> {
        debug!(
            "Running {} {}",
            program,
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let output = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("Failed to run {}", program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("{} exited with {}: {}", program, output.status, last_lines(&stderr, 5));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn segment_args(
        &self,
        clip: &Clip,
        canvas: (u32, u32),
        fps: u32,
        audio_codec: &str,
        output: &Path,
    ) -> Vec<OsString> {
        let filter = format!(
            "pad={}:{}:(ow-iw)/2:(oh-ih)/2:color=black,format=yuv420p",
            canvas.0, canvas.1
        );
        let mut args: Vec<OsString> = Vec::new();
        args.extend(["-y", "-loop", "1", "-framerate"].map(OsString::from));
        args.push(fps.to_string().into());
        args.push("-i".into());
        args.push(clip.image.clone().into());
        args.push("-i".into());
        args.push(clip.audio.clone().into());
        args.push("-t".into());
        args.push(format!("{:.3}", clip.duration).into());
        args.push("-vf".into());
        args.push(filter.into());
        args.push("-r".into());
        args.push(fps.to_string().into());
        args.push("-c:v".into());
        args.push(self.video_codec.clone().into());
        args.extend(["-tune", "stillimage", "-c:a"].map(OsString::from));
        args.push(audio_codec.into());
        args.push(output.into());
        args
    }

    fn concat_args(
        &self,
        list: &Path,
        fps: u32,
        audio_codec: &str,
        output: &Path,
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-y", "-f", "concat", "-safe", "0", "-i"]
            .map(OsString::from)
            .to_vec();
        args.push(list.into());
        args.push("-r".into());
        args.push(fps.to_string().into());
        args.push("-c:v".into());
        args.push(self.video_codec.clone().into());
        args.extend(["-pix_fmt", "yuv420p", "-c:a"].map(OsString::from));
        args.push(audio_codec.into());
        args.push(output.into());
        args
    }

    fn reencode_args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-y".into(), "-i".into(), input.into()];
        args.extend(
            [
                "-c:v",
                REENCODE_VIDEO_CODEC,
                "-c:a",
                REENCODE_AUDIO_CODEC,
                "-strict",
                "experimental",
            ]
            .map(OsString::from),
        );
        args.push(output.into());
        args
    }
}

#[async_trait]
impl MediaBackend for FfmpegBackend {
    async fn audio_duration(&self, audio: &Path) -> Result<f64> {
        let mut args: Vec<OsString> = [
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ]
        .map(OsString::from)
        .to_vec();
        args.push(audio.into());

        let stdout = self.run(&self.ffprobe, args).await?;
        parse_duration(&stdout).with_context(|| format!("Bad duration for {}", audio.display()))
    }

    async fn image_dimensions(&self, image: &Path) -> Result<(u32, u32)> {
        let mut args: Vec<OsString> = [
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height",
            "-of",
            "csv=s=x:p=0",
        ]
        .map(OsString::from)
        .to_vec();
        args.push(image.into());

        let stdout = self.run(&self.ffprobe, args).await?;
        parse_dimensions(&stdout).with_context(|| format!("Bad dimensions for {}", image.display()))
    }

    async fn compose(
        &self,
        clips: &[Clip],
        canvas: (u32, u32),
        fps: u32,
        audio_codec: &str,
        output: &Path,
    ) -> Result<()> {
        let scratch = ScratchDir::create(scratch_dir_for(output)).await?;

        let mut list = String::new();
        for clip in clips {
            let segment = scratch.path().join(format!("segment_{}.mp4", clip.scene_number));
            let args = self.segment_args(clip, canvas, fps, audio_codec, &segment);
            self.run(&self.ffmpeg, args)
                .await
                .with_context(|| format!("Failed to render clip for scene {}", clip.scene_number))?;

            let absolute = tokio::fs::canonicalize(&segment).await?;
            list.push_str(&concat_entry(&absolute));
        }

        let list_path = scratch.path().join("concat.txt");
        tokio::fs::write(&list_path, list).await?;

        let args = self.concat_args(&list_path, fps, audio_codec, output);
        self.run(&self.ffmpeg, args)
            .await
            .context("Failed to concatenate clips")?;
        Ok(())
    }

    async fn reencode(&self, input: &Path, output: &Path) -> Result<()> {
        let args = self.reencode_args(input, output);
        self.run(&self.ffmpeg, args).await?;
        Ok(())
    }
}

/// Removes its directory when dropped, on success and error paths alike.
struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    async fn create(path: PathBuf) -> Result<Self> {
        tokio::fs::create_dir_all(&path)
            .await
            .with_context(|| format!("Failed to create {}", path.display()))?;
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            log::warn!("Failed to remove {}: {}", self.path.display(), e);
        }
    }
}

fn scratch_dir_for(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "video".to_string());
    output.with_file_name(format!("{}_segments", stem))
}

/// One line of an ffmpeg concat demuxer list.
fn concat_entry(path: &Path) -> String {
    let escaped = path.to_string_lossy().replace('\'', "'\\''");
    format!("file '{}'\n", escaped)
}

fn parse_duration(stdout: &str) -> Result<f64> {
    let value = stdout.trim();
    let duration: f64 = value
        .parse()
        .map_err(|_| anyhow!("ffprobe returned '{}' instead of a duration", value))?;
    if !duration.is_finite() || duration <= 0.0 {
        bail!("Non-positive duration: {}", duration);
    }
    Ok(duration)
}

fn parse_dimensions(stdout: &str) -> Result<(u32, u32)> {
    let line = stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| anyhow!("ffprobe returned no video stream"))?;
    let (w, h) = line
        .split_once('x')
        .ok_or_else(|| anyhow!("Unexpected dimensions '{}'", line))?;
    let width = w.trim().parse()?;
    let height = h.trim().trim_end_matches('x').parse()?;
    Ok((width, height))
}

fn last_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.trim().lines().collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}
