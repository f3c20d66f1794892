use crate::geo::Location4D;

/// シミュレーション対象の幼生粒子
///
/// 位置履歴（時系列・追記のみ）と現在の生活段階インデックスを保持します。
/// 位置履歴はランの主要な出力成果物で、下流（プロット・エクスポート）との
/// 安定した契約として (緯度, 経度, 深度, 時刻) の列を提供します。
#[derive(Debug, Clone)]
pub struct Particle {
    /// 粒子の一意識別子
    id: usize,
    /// 位置履歴（先頭は放流点、時系列順）
    locations: Vec<Location4D>,
    /// 現在の生活段階インデックス（単調非減少）
    lifestage_index: usize,
}

impl Particle {
    /// 放流点 1 点を持つ粒子を作成する
    pub fn new(id: usize, seed_location: Location4D) -> Self {
        Self {
            id,
            locations: vec![seed_location],
            lifestage_index: 0,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// 現在位置（履歴の最終要素）
    pub fn location(&self) -> &Location4D {
        // 履歴は構築時に 1 要素以上であることが保証されている
        self.locations.last().expect("particle history is never empty")
    }

    /// 位置履歴全体
    pub fn locations(&self) -> &[Location4D] {
        &self.locations
    }

    /// ステップ終了時の確定位置を履歴に追記する
    pub fn append_location(&mut self, location: Location4D) {
        self.locations.push(location);
    }

    /// 放流からの経過時間（秒）
    pub fn age_s(&self, now_s: f64) -> f64 {
        now_s - self.locations[0].time
    }

    pub fn lifestage_index(&self) -> usize {
        self.lifestage_index
    }

    /// 生活段階インデックスを 1 つ進める
    pub fn advance_lifestage(&mut self) {
        self.lifestage_index += 1;
    }
}
