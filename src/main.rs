fn main() {
    physioplay_lib::run()
}
