use tracing::debug;

use crate::geo::Location4D;
use crate::models::common::MovementResult;
use crate::models::lifestage::LifeStage;
use crate::models::particle::Particle;
use crate::models::traits::MovementModel;

/// 生活段階に応じた行動モデル
///
/// 読み込み済みの生活段階の順序列を所有します。構築時に終端の `Dead`
/// 段階を必ず末尾へ追加するため、粒子の段階インデックスが列の外を
/// 指すことはありません。外を指した場合は構築時不変条件の破れであり、
/// 回復可能な状態ではないため panic します。
pub struct LarvaBehavior {
    stages: Vec<LifeStage>,
}

impl LarvaBehavior {
    /// 生活段階の列から行動モデルを作る（Dead を末尾に追加）
    pub fn new(mut stages: Vec<LifeStage>) -> Self {
        // 全ての段階を過ぎた粒子の行き先は常に Dead
        stages.retain(|s| !s.is_dead());
        stages.push(LifeStage::Dead);
        Self { stages }
    }

    pub fn stages(&self) -> &[LifeStage] {
        &self.stages
    }

    /// 終端 Dead 段階のインデックス
    pub fn dead_index(&self) -> usize {
        self.stages.len() - 1
    }

    fn stage_for(&self, particle: &Particle) -> &LifeStage {
        self.stages.get(particle.lifestage_index()).unwrap_or_else(|| {
            // Dead が常に末尾にあるため、ここに到達するのはプログラミングエラー
            panic!(
                "lifestage index {} outside declared stages (len {})",
                particle.lifestage_index(),
                self.stages.len()
            )
        })
    }

    /// 段階インデックス `index` の終了年齢（秒）
    ///
    /// 先頭から `index` までの継続時間の累積。Dead では None。
    fn stage_end_age_s(&self, index: usize) -> Option<f64> {
        let mut total = 0.0;
        for stage in self.stages.iter().take(index + 1) {
            total += stage.duration_s()?;
        }
        Some(total)
    }
}

impl MovementModel for LarvaBehavior {
    fn name(&self) -> &str {
        "behavior"
    }

    fn move_particle(
        &self,
        particle: &Particle,
        location: &Location4D,
        _u: f64,
        _v: f64,
        _w: f64,
        step_s: f64,
    ) -> MovementResult {
        self.stage_for(particle).move_from(location, step_s)
    }

    fn advance_lifestage(&self, particle: &mut Particle, now_s: f64) {
        let age = particle.age_s(now_s);
        // 現在の段階の継続時間条件が満たされなくなるまで進める。
        // Dead（duration_s = None）は吸収状態で、一度到達したら変化しない。
        while let Some(end_age) = self.stage_end_age_s(particle.lifestage_index()) {
            if age < end_age {
                break;
            }
            particle.advance_lifestage();
            debug!(
                particle = particle.id(),
                stage = self.stage_for(particle).name(),
                age_s = age,
                "生活段階が遷移しました"
            );
        }
    }
}
